//! Kernel utilities shared by everything that drives the gate.
//! Keep this crate lightweight; today it only owns layered config loading.
//!
//! ## Config loading
//! ```rust,ignore
//! use biogate_kernel::config::load_app_config;
//! let cfg = load_app_config(Some("biogate")).unwrap();
//! assert!(cfg.gate.force_fail_on_change);
//! ```
pub mod config;

pub use biogate_domain as domain;
