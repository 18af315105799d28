use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-defined identifier of a protected capability.
///
/// Any non-empty string is accepted after trimming surrounding whitespace, so
/// human-readable names such as `"Passcode Screen Auth"` are valid.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeatureName(String);

/// Rejected feature name (empty or whitespace only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFeatureName(pub String);

impl fmt::Display for InvalidFeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feature name must not be empty (got {:?})", self.0)
    }
}

impl std::error::Error for InvalidFeatureName {}

impl FeatureName {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for FeatureName {
    type Error = InvalidFeatureName;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(InvalidFeatureName(value.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl TryFrom<String> for FeatureName {
    type Error = InvalidFeatureName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().len() == value.len() && !value.is_empty() {
            return Ok(Self(value));
        }
        Self::try_from(value.as_str())
    }
}

impl From<FeatureName> for String {
    fn from(value: FeatureName) -> Self {
        value.0
    }
}

impl AsRef<str> for FeatureName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a single feature flag.
///
/// `Unconfigured` behaves like `Disabled` for authentication purposes but is
/// kept distinct so diagnostics can tell "never touched" from "turned off".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureState {
    #[default]
    Unconfigured,
    Enabled,
    Disabled,
}

impl FeatureState {
    #[must_use]
    pub const fn is_gated(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl From<Option<bool>> for FeatureState {
    fn from(flag: Option<bool>) -> Self {
        match flag {
            None => Self::Unconfigured,
            Some(true) => Self::Enabled,
            Some(false) => Self::Disabled,
        }
    }
}

impl fmt::Display for FeatureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unconfigured => "unconfigured",
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        })
    }
}
