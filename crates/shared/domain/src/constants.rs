/// Store key holding the feature-name-to-flag mapping.
pub const FEATURES_KEY: &str = "biometric_auth.features";
/// Store key holding the last accepted enrollment fingerprint.
pub const DOMAIN_STATE_KEY: &str = "biometric_auth.domain_state";

/// Environment prefix for configuration overrides (`BIOGATE__GATE__...`).
pub const ENV_PREFIX: &str = "BIOGATE";
/// Default configuration file stem, resolved relative to the working directory.
pub const DEFAULT_CONFIG: &str = "biogate";
