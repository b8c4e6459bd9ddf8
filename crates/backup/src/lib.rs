//! The backup pipeline.
//!
//! [`BackupService`] feeds inbound chat events through the correlation
//! engine. Each matched command/link pair runs on its own task in the
//! [`BackupOrchestrator`]: fetch the page once, then summarize and/or archive
//! it, replying to the sender after each step.

pub mod orchestrator;
pub mod paths;
pub mod replies;
pub mod sanitize;
pub mod service;

pub use {
    orchestrator::{BackupOrchestrator, BackupSettings, RunReport, StepOutcome},
    paths::ArchivePath,
    sanitize::sanitize_segment,
    service::BackupService,
};
