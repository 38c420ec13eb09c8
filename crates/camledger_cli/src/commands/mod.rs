//! CLI command implementations.

pub mod compact;
pub mod inspect;
pub mod invoke;
