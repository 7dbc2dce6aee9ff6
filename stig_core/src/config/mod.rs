//! Configuration module for the STIG tooling
//!
//! Security limits are compile-time constants; user preferences are runtime values
//! read from the environment or a TOML file.

pub mod constants;
pub mod runtime;

pub use constants::compile_time;
