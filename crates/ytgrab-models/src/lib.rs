//! Shared data models for the ytgrab backend.
//!
//! This crate provides:
//! - The download job record and its lifecycle status
//! - Time-based job id generation
//! - YouTube URL validation and canonicalization
//! - Requested-format types shared by the API and media layers

pub mod format;
pub mod job;
pub mod url;

pub use format::FormatKind;
pub use job::{next_job_id, Job, JobStatus};
pub use url::{clean_youtube_url, extract_video_id, is_valid_youtube_url};
