//! Durable, versioned file storage.
//!
//! [`RepositoryStore`] is the seam the backup pipeline writes through;
//! [`GitHubRepository`] implements it over the GitHub REST API (contents
//! endpoints for single files, git data endpoints for multi-file commits).

pub mod error;
pub mod github;
pub mod store;
pub mod types;

pub use {
    error::{Result, StoreError},
    github::GitHubRepository,
    store::RepositoryStore,
    types::WriteConfirmation,
};
