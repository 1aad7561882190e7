use std::fmt;

/// Failures reported by [`FixedSizeMap`](crate::FixedSizeMap).
///
/// A missing key on lookup or removal is not an error; those return `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    /// The requested capacity was zero, negative, or above `u32::MAX`.
    InvalidArgument,
    /// Every slot is occupied. The map is unchanged.
    CapacityExhausted,
    /// The key's digest is already present. This also fires for two distinct
    /// keys whose digests collide. The map is unchanged.
    DuplicateKey,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => {
                write!(f, "capacity must be between 1 and {}", u32::MAX)
            }
            Self::CapacityExhausted => write!(f, "map is at full capacity"),
            Self::DuplicateKey => write!(f, "key already used"),
        }
    }
}

impl std::error::Error for MapError {}
