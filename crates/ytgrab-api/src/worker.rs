//! Background download worker.
//!
//! One worker task per accepted download request. The worker owns all
//! writes to its job's registry entry; handlers only read.

use std::sync::Arc;

use tracing::{error, info};

use ytgrab_media::{select_format, DownloadRequest, ProgressEvent, ProgressSink, OUTPUT_FILE_PREFIX};
use ytgrab_models::FormatKind;

use crate::error::{ApiError, ApiResult};
use crate::registry::JobRegistry;
use crate::state::AppState;

/// Everything a worker needs to run one download.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub id: String,
    pub url: String,
    pub format_type: FormatKind,
    pub quality: String,
}

/// Spawn a tracked worker task for `job`.
///
/// Failures never propagate out of the task; they land in the registry as
/// the job's terminal `error` state.
pub fn spawn(state: AppState, job: DownloadJob) {
    let tracker = state.tasks.clone();
    tracker.spawn(async move {
        let id = job.id.clone();
        if let Err(err) = run(&state, job).await {
            error!(job_id = %id, error = %err, "Download job failed");
            state.registry.fail(&id, err.to_string());
        }
    });
}

async fn run(state: &AppState, job: DownloadJob) -> ApiResult<()> {
    info!(
        job_id = %job.id,
        url = %job.url,
        format = %job.format_type,
        quality = %job.quality,
        "Starting download job"
    );

    let ffmpeg = state.backend.ffmpeg_available().await;
    let selection = select_format(job.format_type, &job.quality, ffmpeg);

    let template = state
        .config
        .temp_dir
        .join(format!("{OUTPUT_FILE_PREFIX}{}_%(title)s.%(ext)s", job.id))
        .to_string_lossy()
        .into_owned();

    let request = DownloadRequest {
        url: job.url.clone(),
        selection,
        output_template: template,
    };
    let sink = registry_sink(Arc::clone(&state.registry), job.id.clone());
    let outcome = state.backend.download(&request, sink).await?;

    let output_name = outcome
        .output_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ApiError::internal("download produced a path with no file name"))?;
    // Present the file under its title, without the job-id prefix.
    let download_name = output_name
        .strip_prefix(&format!("{OUTPUT_FILE_PREFIX}{}_", job.id))
        .unwrap_or(&output_name)
        .to_string();

    info!(job_id = %job.id, file = %download_name, "Download job completed");
    state
        .registry
        .complete(&job.id, outcome.output_path, download_name);
    Ok(())
}

/// Progress sink that forwards backend events into the registry.
pub(crate) fn registry_sink(registry: Arc<JobRegistry>, job_id: String) -> ProgressSink {
    Arc::new(move |event| match event {
        ProgressEvent::Downloading { .. } => registry.set_downloading(&job_id, event.percent()),
        ProgressEvent::PostProcessing => registry.set_processing(&job_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::test_support::FakeBackend;
    use std::path::PathBuf;
    use ytgrab_models::JobStatus;

    fn state_with(backend: FakeBackend) -> AppState {
        AppState::new(ApiConfig::default(), Arc::new(backend))
    }

    #[test]
    fn test_sink_forwards_progress_in_order() {
        let registry = Arc::new(JobRegistry::new());
        registry.create("dl_1");
        let sink = registry_sink(Arc::clone(&registry), "dl_1".to_string());

        sink(ProgressEvent::Downloading {
            downloaded_bytes: 0,
            total_bytes: Some(100),
        });
        assert_eq!(registry.get("dl_1").status, JobStatus::Downloading);
        assert_eq!(registry.get("dl_1").progress, 0.0);

        sink(ProgressEvent::Downloading {
            downloaded_bytes: 50,
            total_bytes: Some(100),
        });
        assert_eq!(registry.get("dl_1").progress, 50.0);

        sink(ProgressEvent::PostProcessing);
        let job = registry.get("dl_1");
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, 100.0);
    }

    #[tokio::test]
    async fn test_successful_job_completes_with_stripped_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("ytgrab_dl_9_My Video.mp4");

        let backend = FakeBackend::new()
            .with_events(vec![
                ProgressEvent::Downloading {
                    downloaded_bytes: 25,
                    total_bytes: Some(100),
                },
                ProgressEvent::Downloading {
                    downloaded_bytes: 100,
                    total_bytes: Some(100),
                },
                ProgressEvent::PostProcessing,
            ])
            .with_output(output.clone());
        let state = state_with(backend);
        state.registry.create("dl_9");

        spawn(
            state.clone(),
            DownloadJob {
                id: "dl_9".to_string(),
                url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
                format_type: FormatKind::Video,
                quality: "720p".to_string(),
            },
        );
        state.tasks.close();
        state.tasks.wait().await;

        let job = state.registry.get("dl_9");
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100.0);
        assert_eq!(job.output_path, Some(output));
        assert_eq!(job.output_name.as_deref(), Some("My Video.mp4"));
    }

    #[tokio::test]
    async fn test_failed_job_lands_in_error_state() {
        let state = state_with(FakeBackend::new()); // no output configured
        state.registry.create("dl_2");

        spawn(
            state.clone(),
            DownloadJob {
                id: "dl_2".to_string(),
                url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
                format_type: FormatKind::Audio,
                quality: "mp3".to_string(),
            },
        );
        state.tasks.close();
        state.tasks.wait().await;

        let job = state.registry.get("dl_2");
        assert_eq!(job.status, JobStatus::Error);
        assert!(job.error_message.is_some());
    }

    #[tokio::test]
    async fn test_output_name_without_job_prefix_passes_through() {
        let backend =
            FakeBackend::new().with_output(PathBuf::from("/tmp/plain-name.mp3"));
        let state = state_with(backend);
        state.registry.create("dl_3");

        spawn(
            state.clone(),
            DownloadJob {
                id: "dl_3".to_string(),
                url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
                format_type: FormatKind::Audio,
                quality: "mp3".to_string(),
            },
        );
        state.tasks.close();
        state.tasks.wait().await;

        let job = state.registry.get("dl_3");
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.output_name.as_deref(), Some("plain-name.mp3"));
    }
}
