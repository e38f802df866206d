use serde::{Deserialize, Serialize};

/// Microphone authorization status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    /// The user has not been asked yet.
    #[default]
    NotDetermined,
    /// The user allowed microphone access.
    Granted,
    /// The user refused (or dismissed the prompt).
    Denied,
}

impl PermissionState {
    /// Whether recording may start.
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Self::NotDetermined => 0,
            Self::Granted => 1,
            Self::Denied => 2,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Granted,
            2 => Self::Denied,
            _ => Self::NotDetermined,
        }
    }

    /// Fold a fresh platform reading into a previously observed status.
    ///
    /// A granted status never falls back to `NotDetermined`; only an explicit
    /// denial can replace it.
    pub(crate) fn merge(self, observed: Self) -> Self {
        match (self, observed) {
            (Self::Granted, Self::NotDetermined) => Self::Granted,
            (_, observed) => observed,
        }
    }
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::NotDetermined => "not determined",
            Self::Granted => "granted",
            Self::Denied => "denied",
        };
        f.write_str(label)
    }
}
