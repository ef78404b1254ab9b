//! Pure scontrol-output parsing and state machine rules. No I/O here.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::models::JobStatus;
use crate::{Error, Result};

/// Synthesized external state for jobs no longer in the scheduler queue
pub const STATE_NOT_FOUND: &str = "NOT_FOUND";

/// Exit code SLURM reports for a clean run
pub const SUCCESS_EXIT_CODE: &str = "0:0";

static KEY_VALUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)=(\S*)").unwrap());

/// Reason values SLURM uses as placeholders for "nothing to report"
const EMPTY_REASONS: [&str; 3] = ["None", "(null)", "N/A"];

/// Timestamp values SLURM uses when a time is not known
const EMPTY_TIMESTAMPS: [&str; 4] = ["Unknown", "N/A", "(null)", "None"];

/// Summary of a scheduler job, as consumed by the monitors
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    /// Raw scheduler state (e.g. RUNNING, CANCELLED, NOT_FOUND)
    pub external_state: String,
    pub internal_status: JobStatus,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub exit_code: Option<String>,
    pub reason: Option<String>,
    pub is_finished: bool,
    pub is_successful: bool,
    pub error_message: Option<String>,
}

/// Parse `scontrol show job` output into key/value pairs.
///
/// The output is whitespace-separated `Key=Value` tokens, possibly spread over
/// several lines. Empty output is a parse error.
pub fn parse_scontrol_output(output: &str) -> Result<HashMap<String, String>> {
    if output.trim().is_empty() {
        return Err(Error::scheduler("Empty scontrol output"));
    }

    let mut fields = HashMap::new();
    for line in output.lines() {
        for capture in KEY_VALUE_RE.captures_iter(line) {
            fields.insert(capture[1].to_string(), capture[2].to_string());
        }
    }

    if fields.is_empty() {
        return Err(Error::scheduler("No job information found in scontrol output"));
    }

    Ok(fields)
}

/// Map a SLURM job state onto the internal status set.
///
/// SUSPENDED counts as still running; NOT_FOUND means the job completed and
/// was removed from the queue. Anything unrecognized is treated as FAILED.
pub fn map_slurm_state(slurm_state: &str) -> JobStatus {
    match slurm_state {
        "PENDING" => JobStatus::Pending,
        "RUNNING" | "SUSPENDED" => JobStatus::Running,
        "COMPLETED" | STATE_NOT_FOUND => JobStatus::Completed,
        _ => JobStatus::Failed,
    }
}

/// Whether the external state is a finished one.
///
/// NOT_FOUND is finished (the queue no longer knows the job); the empty
/// string is not.
pub fn is_job_finished(slurm_state: &str) -> bool {
    matches!(
        slurm_state,
        "COMPLETED" | "FAILED" | "CANCELLED" | "TIMEOUT" | "OUT_OF_MEMORY" | "NODE_FAIL" | STATE_NOT_FOUND
    )
}

/// Success predicate: exit code `0:0` and nothing else.
pub fn is_job_successful(exit_code: Option<&str>) -> bool {
    exit_code == Some(SUCCESS_EXIT_CODE)
}

/// Validate a status transition against the state machine.
///
/// ```text
/// PENDING   -> {PENDING, RUNNING, FAILED}
/// RUNNING   -> {RUNNING, COMPLETED, FAILED}
/// COMPLETED -> {COMPLETED}
/// FAILED    -> {FAILED}
/// ```
pub fn is_valid_transition(current: JobStatus, next: JobStatus) -> bool {
    if current == next {
        return true;
    }

    match current {
        JobStatus::Pending => matches!(next, JobStatus::Running | JobStatus::Failed),
        JobStatus::Running => matches!(next, JobStatus::Completed | JobStatus::Failed),
        JobStatus::Completed | JobStatus::Failed => false,
    }
}

/// Whether a job in this status should still be polled.
pub fn should_monitor(status: JobStatus) -> bool {
    matches!(status, JobStatus::Pending | JobStatus::Running)
}

fn is_empty_reason(reason: &str) -> bool {
    EMPTY_REASONS.contains(&reason)
}

/// Compose an error message for a job that finished unsuccessfully.
///
/// Returns `None` when the job is not finished or finished successfully
/// (NOT_FOUND is assumed successful and never yields a message).
pub fn extract_error_message(
    slurm_state: &str,
    exit_code: Option<&str>,
    reason: Option<&str>,
) -> Option<String> {
    if !is_job_finished(slurm_state) || is_job_successful(exit_code) {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();

    if !slurm_state.is_empty() {
        parts.push(format!("Job state: {}", slurm_state));
    }

    if let Some(code) = exit_code {
        if code != SUCCESS_EXIT_CODE {
            parts.push(format!("Exit code: {}", code));
        }
    }

    if let Some(r) = reason {
        if !r.is_empty() && !is_empty_reason(r) {
            parts.push(format!("Reason: {}", r));
        }
    }

    match slurm_state {
        "CANCELLED" => parts.push("Job was cancelled".to_string()),
        "TIMEOUT" => parts.push("Job exceeded time limit".to_string()),
        "OUT_OF_MEMORY" => parts.push("Job ran out of memory".to_string()),
        "NODE_FAIL" => parts.push("Node failure occurred".to_string()),
        "FAILED" => {
            if exit_code.is_some_and(|c| c != SUCCESS_EXIT_CODE) {
                parts.push("Job failed with non-zero exit code".to_string());
            } else {
                parts.push("Job failed".to_string());
            }
        }
        _ => {}
    }

    if parts.is_empty() {
        Some(format!("Job failed with state: {}", slurm_state))
    } else {
        Some(parts.join("; "))
    }
}

/// Parse a SLURM timestamp (`2025-09-13T12:14:02`); placeholder tokens yield `None`.
pub fn parse_slurm_timestamp(timestamp: &str) -> Option<NaiveDateTime> {
    if timestamp.is_empty() || EMPTY_TIMESTAMPS.contains(&timestamp) {
        return None;
    }

    match NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S") {
        Ok(ts) => Some(ts),
        Err(_) => {
            tracing::warn!("Failed to parse timestamp: {}", timestamp);
            None
        }
    }
}

/// Build the job summary the monitors consume from parsed scontrol fields.
pub fn extract_job_summary(fields: &HashMap<String, String>) -> JobInfo {
    let external_state = fields.get("JobState").cloned().unwrap_or_default();
    let internal_status = map_slurm_state(&external_state);
    let exit_code = fields.get("ExitCode").cloned();
    let reason = fields.get("Reason").cloned();

    let error_message = if internal_status == JobStatus::Failed {
        extract_error_message(&external_state, exit_code.as_deref(), reason.as_deref())
    } else {
        None
    };

    JobInfo {
        internal_status,
        start_time: fields.get("StartTime").and_then(|t| parse_slurm_timestamp(t)),
        end_time: fields.get("EndTime").and_then(|t| parse_slurm_timestamp(t)),
        is_finished: is_job_finished(&external_state),
        is_successful: is_job_successful(exit_code.as_deref()),
        external_state,
        exit_code,
        reason,
        error_message,
    }
}

/// Summary for a job the queue no longer knows about.
///
/// Completion time is the caller's clock; the start time is unknown and the
/// job is assumed to have exited cleanly.
pub fn not_found_summary(now: NaiveDateTime) -> JobInfo {
    JobInfo {
        external_state: STATE_NOT_FOUND.to_string(),
        internal_status: JobStatus::Completed,
        start_time: None,
        end_time: Some(now),
        exit_code: Some(SUCCESS_EXIT_CODE.to_string()),
        reason: Some("Job completed and removed from queue".to_string()),
        is_finished: true,
        is_successful: true,
        error_message: None,
    }
}

/// Human-readable reason for a state transition, used in monitor logs.
pub fn transition_reason(current: JobStatus, next: JobStatus, info: &JobInfo) -> String {
    if current == next {
        return format!("Status unchanged: {}", current);
    }

    match next {
        JobStatus::Running => {
            format!("Job started running (scheduler state: {})", info.external_state)
        }
        JobStatus::Completed => {
            if info.external_state == STATE_NOT_FOUND {
                "Job completed and removed from queue (assumed successful)".to_string()
            } else if info.exit_code.as_deref() == Some(SUCCESS_EXIT_CODE) {
                format!(
                    "Job completed successfully (scheduler state: {}, exit code: {})",
                    info.external_state, SUCCESS_EXIT_CODE
                )
            } else {
                format!(
                    "Job completed (scheduler state: {}, exit code: {:?})",
                    info.external_state, info.exit_code
                )
            }
        }
        JobStatus::Failed => match info.reason.as_deref() {
            Some(r) if !r.is_empty() && !is_empty_reason(r) => format!(
                "Job failed (scheduler state: {}, reason: {})",
                info.external_state, r
            ),
            _ => format!("Job failed (scheduler state: {})", info.external_state),
        },
        JobStatus::Pending => format!(
            "Status changed from {} to {} (scheduler state: {})",
            current, next, info.external_state
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const RUNNING_OUTPUT: &str = "JobId=12345 JobName=seg_train\n   \
        UserId=user(1000) GroupId=user(1000)\n   \
        JobState=RUNNING Reason=None Dependency=(null)\n   \
        ExitCode=0:0\n   \
        StartTime=2025-09-13T12:14:02 EndTime=Unknown";

    #[test]
    fn test_parse_scontrol_output() {
        let fields = parse_scontrol_output(RUNNING_OUTPUT).unwrap();
        assert_eq!(fields.get("JobId").unwrap(), "12345");
        assert_eq!(fields.get("JobState").unwrap(), "RUNNING");
        assert_eq!(fields.get("ExitCode").unwrap(), "0:0");
        assert_eq!(fields.get("StartTime").unwrap(), "2025-09-13T12:14:02");
    }

    #[test]
    fn test_parse_empty_output_fails() {
        assert!(parse_scontrol_output("").is_err());
        assert!(parse_scontrol_output("   \n  ").is_err());
        assert!(parse_scontrol_output("no pairs here").is_err());
    }

    #[test]
    fn test_state_mapping() {
        assert_eq!(map_slurm_state("PENDING"), JobStatus::Pending);
        assert_eq!(map_slurm_state("RUNNING"), JobStatus::Running);
        assert_eq!(map_slurm_state("SUSPENDED"), JobStatus::Running);
        assert_eq!(map_slurm_state("COMPLETED"), JobStatus::Completed);
        assert_eq!(map_slurm_state("NOT_FOUND"), JobStatus::Completed);
        for failed in [
            "FAILED",
            "CANCELLED",
            "TIMEOUT",
            "OUT_OF_MEMORY",
            "NODE_FAIL",
            "PREEMPTED",
        ] {
            assert_eq!(map_slurm_state(failed), JobStatus::Failed, "{}", failed);
        }
        // Unknown states are failures
        assert_eq!(map_slurm_state("REVOKED"), JobStatus::Failed);
    }

    #[test]
    fn test_transition_table() {
        use JobStatus::*;

        // No-op is always legal
        for s in [Pending, Running, Completed, Failed] {
            assert!(is_valid_transition(s, s));
        }

        assert!(is_valid_transition(Pending, Running));
        assert!(is_valid_transition(Pending, Failed));
        assert!(is_valid_transition(Running, Completed));
        assert!(is_valid_transition(Running, Failed));

        assert!(!is_valid_transition(Pending, Completed));
        assert!(!is_valid_transition(Completed, Running));
        assert!(!is_valid_transition(Completed, Failed));
        assert!(!is_valid_transition(Failed, Pending));
        assert!(!is_valid_transition(Failed, Running));
    }

    #[test]
    fn test_monitorable_states() {
        assert!(should_monitor(JobStatus::Pending));
        assert!(should_monitor(JobStatus::Running));
        assert!(!should_monitor(JobStatus::Completed));
        assert!(!should_monitor(JobStatus::Failed));
    }

    #[test]
    fn test_finished_states() {
        assert!(is_job_finished("COMPLETED"));
        assert!(is_job_finished("CANCELLED"));
        assert!(is_job_finished("NOT_FOUND"));
        assert!(!is_job_finished("RUNNING"));
        assert!(!is_job_finished("PENDING"));
        // Empty string is not in the finished set
        assert!(!is_job_finished(""));
    }

    #[test]
    fn test_success_predicate() {
        assert!(is_job_successful(Some("0:0")));
        assert!(!is_job_successful(Some("1:0")));
        assert!(!is_job_successful(Some("0:9")));
        assert!(!is_job_successful(None));
    }

    #[test]
    fn test_error_message_for_cancelled_job() {
        let msg = extract_error_message("CANCELLED", Some("0:15"), Some("UserRequest")).unwrap();
        assert!(msg.contains("Job state: CANCELLED"));
        assert!(msg.contains("Exit code: 0:15"));
        assert!(msg.contains("Reason: UserRequest"));
        assert!(msg.contains("Job was cancelled"));
    }

    #[test]
    fn test_cancelled_with_clean_exit_code_is_treated_as_successful() {
        assert!(extract_error_message("CANCELLED", Some("0:0"), Some("UserRequest")).is_none());
    }

    #[test]
    fn test_error_message_for_failed_job() {
        let msg = extract_error_message("FAILED", Some("1:0"), Some("None")).unwrap();
        assert_eq!(
            msg,
            "Job state: FAILED; Exit code: 1:0; Job failed with non-zero exit code"
        );
    }

    #[test]
    fn test_error_message_drops_placeholder_reasons() {
        for placeholder in ["None", "(null)", "N/A"] {
            let msg = extract_error_message("TIMEOUT", Some("0:1"), Some(placeholder)).unwrap();
            assert!(!msg.contains("Reason"), "{}", placeholder);
            assert!(msg.contains("Job exceeded time limit"));
        }
    }

    #[test]
    fn test_no_error_message_for_unfinished_or_successful() {
        assert!(extract_error_message("RUNNING", Some("0:0"), None).is_none());
        assert!(extract_error_message("COMPLETED", Some("0:0"), None).is_none());
        // NOT_FOUND is finished but assumed successful
        assert!(extract_error_message("NOT_FOUND", Some("0:0"), None).is_none());
        // The empty state is not finished, so no message either
        assert!(extract_error_message("", Some("1:0"), None).is_none());
    }

    #[test]
    fn test_timestamp_parsing() {
        let expected = NaiveDate::from_ymd_opt(2025, 9, 13)
            .unwrap()
            .and_hms_opt(12, 14, 2)
            .unwrap();
        assert_eq!(parse_slurm_timestamp("2025-09-13T12:14:02"), Some(expected));

        for placeholder in ["Unknown", "N/A", "(null)", "None", ""] {
            assert_eq!(parse_slurm_timestamp(placeholder), None, "{}", placeholder);
        }
        assert_eq!(parse_slurm_timestamp("13/09/2025"), None);
    }

    #[test]
    fn test_job_summary_for_running_job() {
        let fields = parse_scontrol_output(RUNNING_OUTPUT).unwrap();
        let info = extract_job_summary(&fields);
        assert_eq!(info.external_state, "RUNNING");
        assert_eq!(info.internal_status, JobStatus::Running);
        assert!(info.start_time.is_some());
        assert!(info.end_time.is_none());
        assert!(!info.is_finished);
        assert!(info.error_message.is_none());
    }

    #[test]
    fn test_job_summary_for_cancelled_job() {
        let output = "JobId=77 JobState=CANCELLED Reason=UserRequest ExitCode=0:15 \
                      StartTime=2025-09-13T12:14:02 EndTime=2025-09-13T12:20:00";
        let fields = parse_scontrol_output(output).unwrap();
        let info = extract_job_summary(&fields);
        assert_eq!(info.internal_status, JobStatus::Failed);
        assert!(info.is_finished);
        assert!(!info.is_successful);
        let msg = info.error_message.unwrap();
        assert!(msg.contains("Job was cancelled"));
        assert!(msg.contains("Reason: UserRequest"));
    }

    #[test]
    fn test_not_found_summary() {
        let now = NaiveDate::from_ymd_opt(2025, 9, 13)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();
        let info = not_found_summary(now);
        assert_eq!(info.external_state, STATE_NOT_FOUND);
        assert_eq!(info.internal_status, JobStatus::Completed);
        assert_eq!(info.end_time, Some(now));
        assert!(info.start_time.is_none());
        assert!(info.is_finished);
        assert!(info.is_successful);
        assert!(info.error_message.is_none());
    }

    #[test]
    fn test_transition_reasons() {
        let fields = parse_scontrol_output(RUNNING_OUTPUT).unwrap();
        let info = extract_job_summary(&fields);

        assert_eq!(
            transition_reason(JobStatus::Running, JobStatus::Running, &info),
            "Status unchanged: RUNNING"
        );
        assert!(transition_reason(JobStatus::Pending, JobStatus::Running, &info)
            .contains("started running"));

        let now = chrono::NaiveDate::from_ymd_opt(2025, 9, 13)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();
        let missing = not_found_summary(now);
        assert!(transition_reason(JobStatus::Running, JobStatus::Completed, &missing)
            .contains("removed from queue"));
    }
}
