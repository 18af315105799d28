//! # Domain Models
//!
//! This crate contains pure domain types with a single dependency (`serde`).
//! Keep it lean: no I/O, no verifier calls, no storage. Just data and simple helpers.

pub mod config;
pub mod constants;
pub mod domain_state;
pub mod features;
