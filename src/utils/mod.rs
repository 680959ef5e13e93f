//! Small shared utilities.

/// Identifier sanitization utilities
pub mod identifier;
