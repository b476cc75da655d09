//! In-memory job registry.
//!
//! Central store of job state. Each job has exactly one writer (its
//! worker) while any number of poll requests read concurrently; the map
//! itself serializes inserts and updates across different keys.
//!
//! Terminal states stick: once a job is `completed` or `error`, further
//! lifecycle writes are ignored.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, info};

use ytgrab_models::Job;

/// Concurrent map of job-id to job state.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new job in `starting` state.
    pub fn create(&self, id: &str) {
        self.jobs.write().insert(id.to_string(), Job::new(id));
    }

    /// Latest committed state for `id`.
    ///
    /// Unknown ids yield the `not_found` sentinel rather than an error;
    /// pruned records look the same as ids that never existed.
    pub fn get(&self, id: &str) -> Job {
        self.jobs
            .read()
            .get(id)
            .cloned()
            .unwrap_or_else(|| Job::not_found(id))
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    pub fn set_downloading(&self, id: &str, percent: f64) {
        self.update(id, |job| job.set_downloading(percent));
    }

    pub fn set_processing(&self, id: &str) {
        self.update(id, |job| job.set_processing());
    }

    pub fn complete(&self, id: &str, output_path: PathBuf, output_name: String) {
        self.update(id, |job| job.complete(output_path, output_name));
    }

    pub fn fail(&self, id: &str, message: impl Into<String>) {
        self.update(id, |job| job.fail(message));
    }

    /// Apply a lifecycle write unless the job is already terminal.
    fn update<F: FnOnce(&mut Job)>(&self, id: &str, mutate: F) {
        let mut jobs = self.jobs.write();
        match jobs.get_mut(id) {
            Some(job) if !job.is_terminal() => mutate(job),
            Some(job) => {
                debug!(job_id = %id, status = %job.status, "Ignoring write to terminal job")
            }
            None => debug!(job_id = %id, "Ignoring write to unknown job"),
        }
    }

    /// Drop terminal job records older than `max_age`.
    ///
    /// Bounds registry growth with the same retention window as the file
    /// reaper. In-flight jobs are never pruned.
    pub fn prune_terminal(&self, max_age: Duration) -> usize {
        let max_age = chrono::Duration::seconds(max_age.as_secs().min(i64::MAX as u64) as i64);
        let cutoff = Utc::now() - max_age;

        let mut jobs = self.jobs.write();
        let before = jobs.len();
        jobs.retain(|_, job| !(job.is_terminal() && job.updated_at < cutoff));
        let pruned = before - jobs.len();
        drop(jobs);

        if pruned > 0 {
            info!(pruned, "Pruned terminal job records");
        }
        pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ytgrab_models::JobStatus;

    #[test]
    fn test_create_then_get_round_trip() {
        let registry = JobRegistry::new();
        registry.create("dl_1");

        let job = registry.get("dl_1");
        assert_eq!(job.id, "dl_1");
        assert_eq!(job.status, JobStatus::Starting);
        assert_eq!(job.progress, 0.0);
    }

    #[test]
    fn test_unknown_id_yields_not_found_sentinel() {
        let registry = JobRegistry::new();
        let job = registry.get("no-such-job");
        assert_eq!(job.status, JobStatus::NotFound);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_completed_state_round_trip() {
        let registry = JobRegistry::new();
        registry.create("dl_1");
        registry.set_downloading("dl_1", 50.0);
        registry.complete("dl_1", PathBuf::from("/tmp/ytgrab_dl_1_a.mp4"), "a.mp4".to_string());

        let job = registry.get("dl_1");
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100.0);
        assert_eq!(
            job.output_path.as_deref(),
            Some(std::path::Path::new("/tmp/ytgrab_dl_1_a.mp4"))
        );
        assert_eq!(job.output_name.as_deref(), Some("a.mp4"));
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        let registry = JobRegistry::new();
        registry.create("dl_1");
        registry.fail("dl_1", "network unreachable");

        registry.set_downloading("dl_1", 10.0);
        registry.complete("dl_1", PathBuf::from("/tmp/x"), "x".to_string());

        let job = registry.get("dl_1");
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.error_message.as_deref(), Some("network unreachable"));
    }

    #[test]
    fn test_writes_to_unknown_ids_are_ignored() {
        let registry = JobRegistry::new();
        registry.set_downloading("ghost", 50.0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_prune_drops_only_old_terminal_records() {
        let registry = JobRegistry::new();
        registry.create("running");
        registry.set_downloading("running", 30.0);
        registry.create("done");
        registry.complete("done", PathBuf::from("/tmp/f"), "f".to_string());

        // Let the terminal record age past a zero-width window.
        std::thread::sleep(Duration::from_millis(20));
        let pruned = registry.prune_terminal(Duration::ZERO);

        assert_eq!(pruned, 1);
        assert_eq!(registry.get("running").status, JobStatus::Downloading);
        assert_eq!(registry.get("done").status, JobStatus::NotFound);
    }
}
