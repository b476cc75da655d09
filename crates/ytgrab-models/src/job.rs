//! Download job record and lifecycle status.
//!
//! A `Job` tracks one download/transcode request from acceptance to a
//! terminal state. The record is written by exactly one worker and polled
//! by any number of status requests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a download job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job accepted, worker not yet reporting progress
    #[default]
    Starting,
    /// Streams are being fetched
    Downloading,
    /// Streams are on disk, merge/transcode in progress
    Processing,
    /// Output file is ready for retrieval
    Completed,
    /// Job failed with an error message
    Error,
    /// Sentinel for lookups of unknown job ids
    NotFound,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Starting => "starting",
            JobStatus::Downloading => "downloading",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
            JobStatus::NotFound => "not_found",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One tracked download/transcode request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier, assigned once at creation
    pub id: String,
    /// Current lifecycle status
    pub status: JobStatus,
    /// Percentage in [0, 100]; meaningful while downloading
    pub progress: f64,
    /// Absolute path of the finished file; set iff completed
    pub output_path: Option<PathBuf>,
    /// User-facing file name, set at completion
    pub output_name: Option<String>,
    /// Present only when status is `error`
    pub error_message: Option<String>,
    /// When the job was created
    pub created_at: DateTime<Utc>,
    /// When the record was last written
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new job in `starting` state.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status: JobStatus::Starting,
            progress: 0.0,
            output_path: None,
            output_name: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sentinel record returned for lookups of unknown ids.
    ///
    /// Callers treat this as non-fatal: pollers keep polling, retrieval
    /// requests get a 404.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self {
            status: JobStatus::NotFound,
            ..Self::new(id)
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Record download progress. Overwrites the mutable fields wholesale.
    pub fn set_downloading(&mut self, percent: f64) {
        self.status = JobStatus::Downloading;
        self.progress = percent.clamp(0.0, 100.0);
        self.output_path = None;
        self.output_name = None;
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    /// Record that streams are fetched and post-processing has started.
    pub fn set_processing(&mut self) {
        self.status = JobStatus::Processing;
        self.progress = 100.0;
        self.output_path = None;
        self.output_name = None;
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    /// Mark the job completed with its final output file.
    pub fn complete(&mut self, output_path: PathBuf, output_name: impl Into<String>) {
        self.status = JobStatus::Completed;
        self.progress = 100.0;
        self.output_path = Some(output_path);
        self.output_name = Some(output_name.into());
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    /// Mark the job failed with a human-readable message.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Error;
        self.progress = 0.0;
        self.output_path = None;
        self.output_name = None;
        self.error_message = Some(message.into());
        self.updated_at = Utc::now();
    }
}

static JOB_SEQ: AtomicU64 = AtomicU64::new(0);

/// Generate a unique, time-based job id.
///
/// Epoch millis give rough ordering; the process-wide counter keeps ids
/// distinct when many jobs start within the same millisecond. Ids are
/// never reused for the lifetime of the process.
pub fn next_job_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let seq = JOB_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("dl_{millis}_{seq}")
}
