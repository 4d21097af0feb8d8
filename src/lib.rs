//! scaffold-cache - cached retrieval of project templates and API documents
//!
//! Downloads a project template archive and a set of OpenAPI documents,
//! keeps them on disk with time-based expiry, and coordinates concurrent
//! callers both within a process and across processes.

pub mod cache;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetch;
pub mod prompt;
pub mod resources;

pub use coordinator::{CacheStatus, DownloadCoordinator};
pub use error::{ScaffoldError, ScaffoldResult};
pub use resources::{DocumentEntry, DownloadResult, ResourceSpec};
