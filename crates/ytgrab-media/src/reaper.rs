//! Stale output file reaper.
//!
//! Job output lands in a shared temp directory under a job-scoped file
//! prefix. The reaper deletes matches older than the retention window so
//! disk use stays bounded. This is advisory cleanup, not a guarantee: a
//! file can be fetched right up until the sweep removes it, after which
//! retrieval returns not-found even though the job record still reads
//! `completed`.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tokio::fs;
use tracing::{info, warn};

/// Prefix shared by all job output files.
pub const OUTPUT_FILE_PREFIX: &str = "ytgrab_";

/// Periodic sweep over the shared temp directory.
pub struct FileReaper {
    dir: PathBuf,
    max_age: Duration,
}

impl FileReaper {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
        }
    }

    /// Delete stale job output files; returns how many were removed.
    ///
    /// Individual failures are logged and skipped so one bad entry cannot
    /// abort the sweep.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(SystemTime::now()).await
    }

    /// Sweep against an explicit clock. Split out so tests can age files
    /// without rewriting mtimes.
    pub async fn sweep_at(&self, now: SystemTime) -> usize {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), "Reaper could not read temp dir: {}", e);
                return 0;
            }
        };

        let mut deleted = 0;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Reaper could not read directory entry: {}", e);
                    break;
                }
            };

            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(OUTPUT_FILE_PREFIX) {
                continue;
            }
            if !is_stale(&entry, now, self.max_age).await {
                continue;
            }

            match fs::remove_file(entry.path()).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    warn!(file = %entry.path().display(), "Reaper could not delete file: {}", e);
                }
            }
        }

        if deleted > 0 {
            info!(deleted, dir = %self.dir.display(), "Reaped stale download files");
        }
        deleted
    }
}

async fn is_stale(entry: &fs::DirEntry, now: SystemTime, max_age: Duration) -> bool {
    let Ok(metadata) = entry.metadata().await else {
        return false;
    };
    let Ok(modified) = metadata.modified() else {
        return false;
    };
    match now.duration_since(modified) {
        Ok(age) => age > max_age,
        // mtime in the future, leave it alone
        Err(_) => false,
    }
}
