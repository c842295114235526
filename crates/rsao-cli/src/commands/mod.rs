//! CLI command implementations.

pub mod encode;
pub mod mixing_time;
pub mod peaks;
