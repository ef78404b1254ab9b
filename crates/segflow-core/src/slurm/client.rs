//! SLURM client: sbatch submission and scontrol queries

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

use super::command::CommandRunner;
use super::parser::{self, JobInfo};
use crate::config::SlurmConfig;
use crate::{Error, Result};

static JOB_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Submitted batch job (\d+)").unwrap());

/// Scheduler operations the engine depends on.
///
/// Behind a trait so the monitors can be exercised against a mock scheduler.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SchedulerClient: Send + Sync {
    /// Submit a rendered job script; returns the scheduler-assigned id.
    async fn submit(&self, script: &str) -> Result<String>;

    /// Query a job by external id.
    ///
    /// A job the queue no longer knows about is reported as finished
    /// (NOT_FOUND summary), never as an error; only transport failures raise.
    async fn info(&self, external_id: &str) -> Result<JobInfo>;
}

/// SLURM implementation over sbatch/scontrol subprocess calls
pub struct SlurmClient {
    runner: CommandRunner,
    submit_command: String,
    query_command: String,
}

impl SlurmClient {
    pub fn new(config: &SlurmConfig) -> Self {
        Self {
            runner: CommandRunner::new(Duration::from_secs(config.command_timeout_secs)),
            submit_command: config.submit_command.clone(),
            query_command: config.query_command.clone(),
        }
    }

    fn extract_job_id(&self, sbatch_output: &str) -> Result<String> {
        JOB_ID_RE
            .captures(sbatch_output)
            .map(|c| c[1].to_string())
            .ok_or_else(|| {
                Error::submission(format!(
                    "Could not extract job ID from sbatch output: {}",
                    sbatch_output.trim()
                ))
            })
    }
}

#[async_trait]
impl SchedulerClient for SlurmClient {
    async fn submit(&self, script: &str) -> Result<String> {
        // The scratch file is removed on every exit path when the handle drops.
        let mut scratch = tempfile::Builder::new()
            .suffix(".sbatch")
            .tempfile()
            .map_err(|e| Error::submission(format!("Failed to create scratch file: {}", e)))?;

        scratch
            .write_all(script.as_bytes())
            .map_err(|e| Error::submission(format!("Failed to write scratch file: {}", e)))?;
        scratch
            .flush()
            .map_err(|e| Error::submission(format!("Failed to write scratch file: {}", e)))?;

        let path = scratch.path().to_string_lossy().into_owned();
        debug!("Scratch file created: {}", path);

        // Non-zero exit and transport failures alike are submission failures.
        let stdout = self
            .runner
            .execute_checked(&self.submit_command, &[&path])
            .await
            .map_err(|e| Error::submission(e.to_string()))?;

        let job_id = self.extract_job_id(&stdout)?;
        info!("Batch job submitted successfully - external id: {}", job_id);
        Ok(job_id)
    }

    async fn info(&self, external_id: &str) -> Result<JobInfo> {
        debug!("Querying scheduler for job {}", external_id);

        let output = self
            .runner
            .execute(&self.query_command, &["show", "job", external_id])
            .await?;

        if output.success() {
            let fields = parser::parse_scontrol_output(&output.stdout)?;
            let summary = parser::extract_job_summary(&fields);
            debug!(
                "Job {} found in queue - state: {}",
                external_id, summary.external_state
            );
            Ok(summary)
        } else {
            // Gone from the queue: assume it finished and was removed.
            info!(
                "Job {} not found in scheduler queue - treating as completed",
                external_id
            );
            debug!(
                "Query stderr for missing job {}: {}",
                external_id,
                output.stderr.trim()
            );
            Ok(parser::not_found_summary(chrono::Utc::now().naive_utc()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStatus;

    fn client() -> SlurmClient {
        SlurmClient::new(&SlurmConfig::default())
    }

    #[test]
    fn test_extract_job_id() {
        let c = client();
        assert_eq!(
            c.extract_job_id("Submitted batch job 123456\n").unwrap(),
            "123456"
        );
    }

    #[test]
    fn test_extract_job_id_rejects_garbage() {
        let c = client();
        let err = c.extract_job_id("sbatch: error: invalid partition").unwrap_err();
        assert!(matches!(err, Error::Submission(_)));
    }

    #[tokio::test]
    async fn test_submit_via_stub_command() {
        // Use a stand-in submit command that echoes the expected sbatch line.
        let config = SlurmConfig {
            submit_command: "./submit-stub.sh".into(),
            ..SlurmConfig::default()
        };

        let dir = tempfile::tempdir().unwrap();
        let stub = dir.path().join("submit-stub.sh");
        std::fs::write(&stub, "#!/bin/sh\necho 'Submitted batch job 4242'\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let config = SlurmConfig {
            submit_command: stub.to_string_lossy().into_owned(),
            ..config
        };
        let client = SlurmClient::new(&config);
        let id = client.submit("#!/bin/bash\necho training\n").await.unwrap();
        assert_eq!(id, "4242");
    }

    #[tokio::test]
    async fn test_submit_nonzero_exit_is_submission_failure() {
        let config = SlurmConfig {
            submit_command: "false".into(),
            ..SlurmConfig::default()
        };
        let client = SlurmClient::new(&config);
        let err = client.submit("#!/bin/bash\n").await.unwrap_err();
        assert!(matches!(err, Error::Submission(_)));
        assert!(err.to_string().contains("exit code 1"));
    }

    #[tokio::test]
    async fn test_info_missing_job_is_completed() {
        // `false` exits non-zero for any job id, which models eviction.
        let config = SlurmConfig {
            query_command: "false".into(),
            ..SlurmConfig::default()
        };
        let client = SlurmClient::new(&config);
        let info = client.info("999").await.unwrap();
        assert_eq!(info.external_state, parser::STATE_NOT_FOUND);
        assert_eq!(info.internal_status, JobStatus::Completed);
        assert!(info.end_time.is_some());
        assert!(info.start_time.is_none());
        assert!(info.is_successful);
    }

    #[tokio::test]
    async fn test_info_missing_query_command_raises() {
        let config = SlurmConfig {
            query_command: "definitely-not-scontrol-xyz".into(),
            ..SlurmConfig::default()
        };
        let client = SlurmClient::new(&config);
        assert!(client.info("1").await.is_err());
    }
}
