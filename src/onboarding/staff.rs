//! AI staff roster and the user's opt-in selection.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::OnboardingError;

/// An AI-persona chat assistant the user can activate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub specialty: String,
}

impl StaffMember {
    pub fn new(id: impl Into<String>, name: impl Into<String>, specialty: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            specialty: specialty.into(),
        }
    }
}

/// The built-in staff roster.
pub fn default_roster() -> Vec<StaffMember> {
    vec![
        StaffMember::new("manager", "Maya", "Artist management and career strategy"),
        StaffMember::new("publicist", "Theo", "Press, pitching, and release campaigns"),
        StaffMember::new("ar-scout", "Rina", "A&R feedback and collaborator discovery"),
        StaffMember::new("social-strategist", "Jules", "Social content and audience growth"),
        StaffMember::new("legal-advisor", "Sam", "Contracts, splits, and rights"),
        StaffMember::new("tour-manager", "Kai", "Live bookings and routing"),
    ]
}

/// Which staff members are active. Starts with the whole roster selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffSelection {
    roster: Vec<StaffMember>,
    selected: BTreeSet<String>,
}

impl StaffSelection {
    pub fn new(roster: Vec<StaffMember>) -> Self {
        let selected = roster.iter().map(|m| m.id.clone()).collect();
        Self { roster, selected }
    }

    pub fn roster(&self) -> &[StaffMember] {
        &self.roster
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Flip a member's selection. Returns the new state.
    pub fn toggle(&mut self, id: &str) -> Result<bool, OnboardingError> {
        if !self.roster.iter().any(|m| m.id == id) {
            return Err(OnboardingError::UnknownStaff { id: id.to_string() });
        }
        if self.selected.remove(id) {
            Ok(false)
        } else {
            self.selected.insert(id.to_string());
            Ok(true)
        }
    }

    /// Selected ids in roster order.
    pub fn selected_ids(&self) -> Vec<String> {
        self.roster
            .iter()
            .filter(|m| self.selected.contains(&m.id))
            .map(|m| m.id.clone())
            .collect()
    }
}

impl Default for StaffSelection {
    fn default() -> Self {
        Self::new(default_roster())
    }
}
