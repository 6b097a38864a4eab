//! Processing step: a timed sequence of status messages before completion.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Status messages shown while the workspace is being "prepared".
pub fn default_status_messages() -> Vec<String> {
    [
        "Syncing your artist profile",
        "Preparing your identity assets",
        "Activating your AI staff",
        "Configuring your dashboard",
        "Finalizing your workspace",
    ]
    .iter()
    .map(|m| m.to_string())
    .collect()
}

/// How a status sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOutcome {
    /// Every message was shown for a full tick.
    Finished,
    /// The dismiss signal fired first.
    Cancelled,
}

/// Show each message for one `tick`, calling `on_status(index, message)` as it
/// becomes current.
///
/// Stops early when `cancel` flips to `true`. The interval is dropped on
/// return either way.
pub async fn run_status_sequence<F>(
    messages: &[String],
    tick: Duration,
    cancel: &mut watch::Receiver<bool>,
    mut on_status: F,
) -> SequenceOutcome
where
    F: FnMut(usize, &str),
{
    if *cancel.borrow_and_update() {
        return SequenceOutcome::Cancelled;
    }

    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    interval.tick().await;

    let mut cancel_open = true;
    for (index, message) in messages.iter().enumerate() {
        debug!(index, total = messages.len(), message = %message, "Processing status");
        on_status(index, message);

        loop {
            tokio::select! {
                _ = interval.tick() => break,
                changed = cancel.changed(), if cancel_open => match changed {
                    Ok(()) if *cancel.borrow_and_update() => return SequenceOutcome::Cancelled,
                    Ok(()) => {}
                    // Sender gone: nobody can dismiss any more
                    Err(_) => cancel_open = false,
                },
            }
        }
    }

    SequenceOutcome::Finished
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn messages(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("step {i}")).collect()
    }

    #[tokio::test]
    async fn shows_every_message_in_order() {
        let (_tx, mut rx) = watch::channel(false);
        let mut seen = Vec::new();
        let outcome = run_status_sequence(&messages(3), Duration::from_millis(5), &mut rx, |i, m| {
            seen.push((i, m.to_string()));
        })
        .await;
        assert_eq!(outcome, SequenceOutcome::Finished);
        assert_eq!(
            seen,
            vec![
                (0, "step 0".to_string()),
                (1, "step 1".to_string()),
                (2, "step 2".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn waits_one_tick_per_message() {
        let (_tx, mut rx) = watch::channel(false);
        let start = Instant::now();
        run_status_sequence(&messages(3), Duration::from_millis(20), &mut rx, |_, _| {}).await;
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn already_cancelled_shows_nothing() {
        let (_tx, mut rx) = watch::channel(true);
        let mut calls = 0;
        let outcome =
            run_status_sequence(&messages(3), Duration::from_millis(5), &mut rx, |_, _| calls += 1)
                .await;
        assert_eq!(outcome, SequenceOutcome::Cancelled);
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn cancel_mid_sequence_stops_early() {
        let (tx, mut rx) = watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            tx.send_replace(true);
        });
        let mut calls = 0;
        let outcome =
            run_status_sequence(&messages(50), Duration::from_millis(20), &mut rx, |_, _| calls += 1)
                .await;
        assert_eq!(outcome, SequenceOutcome::Cancelled);
        assert!(calls < 50);
    }

    #[tokio::test]
    async fn dropped_sender_does_not_cancel() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);
        let outcome =
            run_status_sequence(&messages(2), Duration::from_millis(5), &mut rx, |_, _| {}).await;
        assert_eq!(outcome, SequenceOutcome::Finished);
    }

    #[test]
    fn default_messages_are_fixed() {
        assert_eq!(default_status_messages().len(), 5);
    }
}
