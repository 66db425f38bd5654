//! Submission return-code interpretation and the asynchronous job loop.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

use rehome_host::{HostService, JobId, SubmitResponse, RETURN_COMPLETED, RETURN_JOB_STARTED};

use crate::error::{ImportError, Result};

/// Default interval between job polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Polling configuration for asynchronous import jobs.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Interval between polls.
    pub interval: Duration,
    /// Abandon polling after this long. `None` tolerates arbitrarily long
    /// host jobs, which is the default.
    pub timeout: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

/// Interpret a submission response and, for asynchronous operations, drive
/// the job to a terminal state.
///
/// Return-code contract of the management service:
/// - [`RETURN_COMPLETED`]: finished synchronously, there is no job to poll.
/// - [`RETURN_JOB_STARTED`]: poll the returned job until its state leaves
///   the active set.
/// - anything else: the submission was rejected outright.
pub async fn drive_import(
    host: &dyn HostService,
    response: SubmitResponse,
    opts: &PollOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    match response.return_code {
        RETURN_COMPLETED => Ok(()),
        RETURN_JOB_STARTED => {
            let job = response.job.ok_or(rehome_host::HostError::MissingJobReference)?;
            poll_job(host, &job, opts, cancel).await
        }
        code => Err(ImportError::Submission {
            code,
            detail: response.error_description,
        }),
    }
}

/// Poll a job until it reaches a terminal state.
///
/// The job reference does not self-update; each pass re-fetches the status
/// from the host. Percent-complete is reported as-is and is not assumed
/// monotonic.
async fn poll_job(
    host: &dyn HostService,
    job: &JobId,
    opts: &PollOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    let started = Instant::now();

    loop {
        let status = host.job_status(job).await?;

        if status.state.is_active() {
            info!(
                job = %job,
                state = %status.state,
                percent = status.percent_complete,
                caption = %status.caption,
                "Import job in progress"
            );

            if let Some(timeout) = opts.timeout {
                if started.elapsed() >= timeout {
                    return Err(ImportError::JobTimeout {
                        timeout,
                        last_state: status.state,
                        percent_complete: status.percent_complete,
                    });
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(ImportError::Cancelled),
                _ = tokio::time::sleep(opts.interval) => {}
            }
            continue;
        }

        if status.state.is_completed() {
            info!(job = %job, "Import job completed");
            return Ok(());
        }

        // Unknown terminal codes are failures; success is never assumed.
        return Err(ImportError::JobFailed {
            state: status.state,
            error_code: status.error_code.unwrap_or(0),
            error_description: status
                .error_description
                .unwrap_or_else(|| "No error description reported".to_string()),
        });
    }
}
