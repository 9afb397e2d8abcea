use std::fmt;

/// Lifecycle of a single item within one batch.
///
/// `Pending -> InFlight -> {NotModified, Replaced, Failed}`; every item ends
/// in exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Pending,
    InFlight,
    NotModified,
    Replaced,
    Failed,
}

impl ItemState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::NotModified | Self::Replaced | Self::Failed)
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::InFlight => "in-flight",
            Self::NotModified => "not-modified",
            Self::Replaced => "replaced",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}
