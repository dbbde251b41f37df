use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

// ============================================================================
// Pickup Value Objects
// ============================================================================

/// FINISH is a lock: a finished request is never edited or deleted again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickupStatus {
    #[default]
    Pending,
    Finish,
}

impl PickupStatus {
    pub const ALL: [PickupStatus; 2] = [PickupStatus::Pending, PickupStatus::Finish];

    pub fn as_str(&self) -> &'static str {
        match self {
            PickupStatus::Pending => "PENDING",
            PickupStatus::Finish => "FINISH",
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, PickupStatus::Finish)
    }
}

impl fmt::Display for PickupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pickup status: {0}")]
pub struct UnknownPickupStatus(pub String);

impl FromStr for PickupStatus {
    type Err = UnknownPickupStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownPickupStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_lock() {
        assert_eq!("finish".parse::<PickupStatus>(), Ok(PickupStatus::Finish));
        assert!("DONE".parse::<PickupStatus>().is_err());
        assert!(PickupStatus::Finish.is_locked());
        assert!(!PickupStatus::default().is_locked());
    }
}
