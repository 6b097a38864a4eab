//! Legal acknowledgment step: read-to-the-end gate and signature capture.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::error::{OnboardingError, SignError};

use super::model::LegalSignature;

/// Signatures must be longer than this many characters.
pub const MIN_SIGNATURE_CHARS: usize = 2;

/// Distance from the document end (in pixels) that still counts as the bottom.
const BOTTOM_TOLERANCE_PX: f64 = 10.0;

/// Records a signature with whatever backs the agreement (document store,
/// e-sign service).
#[async_trait]
pub trait LegalSigner: Send + Sync {
    async fn sign(&self, signature: &str) -> Result<(), SignError>;
}

/// The long-form document presented for signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegalDocument {
    pub title: String,
    pub body: String,
}

impl LegalDocument {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// The standard services agreement shown to new accounts.
    pub fn services_agreement() -> Self {
        Self::new(
            "Artist Services Agreement",
            "\
1. Services. The platform provides distribution tooling, AI-assisted staff, and \
catalog management for recordings you control.

2. Rights. You confirm that you own or control the rights to every recording, \
image, and likeness you upload, and you grant the platform a limited license to \
process them to deliver the services.

3. Identity assets. Reference photos you upload are used only to generate artwork \
and promotional material for your account.

4. Royalties. Distribution royalties are reported monthly and paid out according \
to the payout settings on your account.

5. Termination. You may close your account at any time. Releases already delivered \
to stores are taken down within 30 days of a takedown request.

By typing your full legal name below you agree to these terms.",
        )
    }
}

/// Form state of the legal step.
#[derive(Debug, Clone)]
pub struct LegalAgreement {
    document: LegalDocument,
    reached_bottom: bool,
    signature: String,
    alert: Option<String>,
}

impl LegalAgreement {
    pub fn new(document: LegalDocument) -> Self {
        Self {
            document,
            reached_bottom: false,
            signature: String::new(),
            alert: None,
        }
    }

    pub fn document(&self) -> &LegalDocument {
        &self.document
    }

    /// Report a scroll position. Once the bottom is reached it stays reached.
    pub fn on_scroll(&mut self, offset: f64, viewport_height: f64, content_height: f64) {
        if offset + viewport_height >= content_height - BOTTOM_TOLERANCE_PX {
            self.reached_bottom = true;
        }
    }

    /// Report the initial layout. A document that fits the viewport counts as read.
    pub fn on_layout(&mut self, viewport_height: f64, content_height: f64) {
        if content_height <= viewport_height {
            self.reached_bottom = true;
        }
    }

    pub fn reached_bottom(&self) -> bool {
        self.reached_bottom
    }

    pub fn set_signature(&mut self, text: impl Into<String>) {
        self.signature = text.into();
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Alert left by the last failed submission.
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// Whether the signature input is enabled.
    pub fn can_sign(&self) -> bool {
        self.reached_bottom
    }

    /// Whether the submit button is enabled.
    pub fn can_submit(&self) -> bool {
        self.validate().is_ok()
    }

    fn validate(&self) -> Result<String, OnboardingError> {
        if !self.reached_bottom {
            return Err(OnboardingError::DocumentNotRead);
        }
        let signature = self.signature.trim();
        if signature.chars().count() <= MIN_SIGNATURE_CHARS {
            return Err(OnboardingError::SignatureTooShort {
                min: MIN_SIGNATURE_CHARS,
            });
        }
        Ok(signature.to_string())
    }

    /// Validate and hand the signature to the signer.
    ///
    /// On failure the form stays editable and `alert()` carries the message;
    /// retrying is up to the user.
    pub async fn submit(
        &mut self,
        signer: &dyn LegalSigner,
    ) -> Result<LegalSignature, OnboardingError> {
        self.alert = None;
        let signature = self.validate()?;

        match signer.sign(&signature).await {
            Ok(()) => {
                info!(chars = signature.chars().count(), "Legal agreement signed");
                Ok(LegalSignature {
                    signature,
                    signed_at: Utc::now(),
                })
            }
            Err(e) => {
                warn!(error = %e, "Legal signature submission failed");
                self.alert = Some(format!("We couldn't record your signature: {e}"));
                Err(OnboardingError::SigningFailed(e))
            }
        }
    }
}
