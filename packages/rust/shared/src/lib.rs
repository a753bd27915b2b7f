//! Shared types, error model, and configuration for ghostwriter.
//!
//! This crate is the foundation depended on by all other ghostwriter crates.
//! It provides:
//! - [`GhostwriterError`]: the unified error type, with [`AuthError`],
//!   [`ApiError`] and [`ParseError`] as its structured parts
//! - [`Endpoint`]: site URL plus admin key
//! - Configuration ([`AppConfig`], profiles, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, Overrides, Profile, config_dir, config_file_path, list_profiles,
    load_config, load_config_from, save_config_to, save_profile, save_profile_to,
};
pub use error::{
    ApiError, ApiErrorItem, AuthError, GhostwriterError, MalformedInput, ParseError, Result,
};
pub use types::{API_ROOT, Endpoint, normalize_base_url};
