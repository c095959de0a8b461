use serde::{Deserialize, Serialize};

use crate::domain::PumpStatus;

/// Client-side pump control for one device.
///
/// `Synced` mirrors the last authoritative `pump_status`. A user toggle moves
/// to `Pending` until the next authoritative read arrives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PumpState {
    Synced {
        value: PumpStatus,
    },
    Pending {
        optimistic: PumpStatus,
        confirmed: PumpStatus,
    },
}

impl PumpState {
    pub fn synced(value: PumpStatus) -> Self {
        PumpState::Synced { value }
    }

    /// Value the view should render
    pub fn displayed(&self) -> PumpStatus {
        match self {
            PumpState::Synced { value } => *value,
            PumpState::Pending { optimistic, .. } => *optimistic,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, PumpState::Pending { .. })
    }

    /// Flip the displayed value. Toggling back onto the confirmed value
    /// settles the state again.
    pub fn toggle(self) -> Self {
        let confirmed = match self {
            PumpState::Synced { value } => value,
            PumpState::Pending { confirmed, .. } => confirmed,
        };
        let next = self.displayed().flipped();

        if next == confirmed {
            PumpState::Synced { value: confirmed }
        } else {
            PumpState::Pending {
                optimistic: next,
                confirmed,
            }
        }
    }

    /// Apply an authoritative read. The store always wins.
    pub fn reconcile(self, authoritative: PumpStatus) -> Self {
        PumpState::Synced {
            value: authoritative,
        }
    }
}

impl Default for PumpState {
    fn default() -> Self {
        PumpState::synced(PumpStatus::Off)
    }
}

/// Pump card text
pub fn pump_label(state: &PumpState) -> (&'static str, &'static str) {
    match state.displayed() {
        PumpStatus::On => ("Active", "Turn Off"),
        PumpStatus::Off => ("Inactive", "Turn On"),
    }
}
