//! Metric name and label definitions.
//!
//! Every metric pagekeep records is named here so the exported set is
//! documented in one place.

/// Inbound event correlation
pub mod correlation {
    /// Inbound events seen by the engine, labelled by `kind` (text/share)
    pub const EVENTS_TOTAL: &str = "pagekeep_correlation_events_total";
    /// Events ignored because they were not recognized commands or link shares
    pub const IGNORED_TOTAL: &str = "pagekeep_correlation_ignored_total";
    /// Command/link pairs matched and dispatched
    pub const MATCHES_TOTAL: &str = "pagekeep_correlation_matches_total";
    /// Pending entries discarded because the counterpart arrived too late
    pub const EXPIRED_TOTAL: &str = "pagekeep_correlation_expired_total";
    /// Help replies produced
    pub const HELP_TOTAL: &str = "pagekeep_correlation_help_total";
    /// Senders currently holding pending state
    pub const SENDERS_ACTIVE: &str = "pagekeep_correlation_senders_active";
}

/// Backup pipeline
pub mod backup {
    /// Orchestrator runs started
    pub const RUNS_TOTAL: &str = "pagekeep_backup_runs_total";
    /// Page fetches that failed
    pub const FETCH_ERRORS_TOTAL: &str = "pagekeep_backup_fetch_errors_total";
    /// Duration of the page fetch step in seconds
    pub const FETCH_DURATION_SECONDS: &str = "pagekeep_backup_fetch_duration_seconds";
    /// Archive writes that succeeded
    pub const ARCHIVED_TOTAL: &str = "pagekeep_backup_archived_total";
    /// Archive writes that failed
    pub const ARCHIVE_ERRORS_TOTAL: &str = "pagekeep_backup_archive_errors_total";
}

/// Summarization
pub mod summarizer {
    /// Summarizer calls, one per attempt
    pub const ATTEMPTS_TOTAL: &str = "pagekeep_summarizer_attempts_total";
    /// Summaries that failed after all attempts
    pub const FAILURES_TOTAL: &str = "pagekeep_summarizer_failures_total";
    /// Duration of a single summarizer call in seconds
    pub const REQUEST_DURATION_SECONDS: &str = "pagekeep_summarizer_request_duration_seconds";
}

/// Repository store
pub mod store {
    /// REST requests issued, labelled by `method`
    pub const REQUESTS_TOTAL: &str = "pagekeep_store_requests_total";
    /// Writes rejected because the revision marker was stale
    pub const CONFLICTS_TOTAL: &str = "pagekeep_store_conflicts_total";
    /// Multi-file commits that reached the ref update
    pub const COMMITS_TOTAL: &str = "pagekeep_store_commits_total";
}

/// Common label keys
pub mod labels {
    pub const KIND: &str = "kind";
    pub const METHOD: &str = "method";
    pub const STATUS: &str = "status";
}

/// Histogram buckets
pub mod buckets {
    /// Page fetches include scroll simulation and a settle delay, so the
    /// interesting range starts around five seconds.
    pub const FETCH_DURATION: &[f64] = &[
        1.0, 2.5, 5.0, 7.5, 10.0, 15.0, 20.0, 30.0, 45.0, 60.0, 90.0, 120.0,
    ];

    /// Summarizer call durations, 100ms to 5 minutes
    pub const SUMMARY_DURATION: &[f64] = &[
        0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0, 300.0,
    ];
}
