/// Pipeline and run configuration.
pub mod config;
/// Per-iteration frame production.
pub mod pipeline;
/// Immutable frame descriptions.
pub mod spec;
