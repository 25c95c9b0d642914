/*
 * Responsibility
 * - Exclusions: which requests skip a middleware (path / method / extension / predicate)
 * - Unless: wraps any Middleware with an Exclusions set
 */
mod core;
mod rules;

pub use self::core::Unless;
pub use rules::{ExclusionError, Exclusions, PathPattern};
