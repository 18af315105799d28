use std::fmt;

/// Opaque fingerprint of the biometric credentials currently enrolled on the device.
///
/// Changes whenever a credential is added or removed. The bytes carry no
/// meaning of their own; only equality matters.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DomainState(Vec<u8>);

impl DomainState {
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for DomainState {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for DomainState {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

// Fingerprints are not secrets, but dumping them into logs adds nothing.
impl fmt::Debug for DomainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DomainState({} bytes)", self.0.len())
    }
}

/// Outcome of a successful domain-state check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainCheck {
    /// The stored baseline matches the current enrollment.
    Unchanged,
    /// A new baseline was recorded, or a change was tolerated.
    Accepted,
}
