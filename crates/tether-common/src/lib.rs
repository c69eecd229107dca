//! # tether-common
//!
//! Shared types for the tether mount resolver:
//! - Container ID validation
//! - Standard filesystem paths
//! - Common error types

#![warn(missing_docs)]

pub mod error;
pub mod id;
pub mod paths;

pub use error::{TetherError, TetherResult};
pub use id::ContainerId;
pub use paths::TetherPaths;
