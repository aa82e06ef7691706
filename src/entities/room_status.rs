use serde::{Deserialize, Serialize};
use std::fmt;

/// Room lifecycle status.
///
/// The only legal transition is `Active` -> `Completed`, performed by the
/// settlement flow. Completed rooms never become active again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Room is open, shown in the active listing
    #[default]
    Active,
    /// The loser has paid out; room is archived
    Completed,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl RoomStatus {
    /// Convert from database string representation
    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Check if the room can still be settled
    #[must_use]
    pub const fn can_settle(&self) -> bool {
        matches!(self, Self::Active)
    }
}
