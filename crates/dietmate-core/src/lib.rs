//! # DietMate Core
//!
//! Shared foundation for the DietMate workspace: configuration, the error
//! taxonomy, chat/tool wire types, and the `Provider`/`Tool` traits that the
//! provider, tool, and agent crates implement.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::DietMateConfig;
pub use error::{DietMateError, Result};
