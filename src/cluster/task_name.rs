//! Canonical task names
//!
//! Formats and parses `/job:<job_name>/task:<task_id>`.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DistError, Result};

/// Accepts a valid task prefix; anything after it (e.g. `/device:CPU:0`) is ignored.
static TASK_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/job:([a-zA-Z][_a-zA-Z0-9]*)/task:([0-9]|[1-9][0-9]+)(?:/.*)?$")
        .expect("task name regex is valid")
});

static JOB_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][_a-zA-Z0-9]*$").expect("job name regex is valid"));

/// Build the canonical task name for a job and task id
pub fn concat_task_name(job_name: &str, task_id: u32) -> String {
    format!("/job:{}/task:{}", job_name, task_id)
}

/// Split a task name into its job name and task id
pub fn parse_task_name(task_name: &str) -> Result<(String, u32)> {
    let captures = TASK_NAME_RE.captures(task_name).ok_or_else(|| {
        DistError::invalid_argument(format!(
            "Error parsing task name \"{}\": expected /job:<job_name>/task:<task_id>",
            task_name
        ))
    })?;

    let job_name = captures[1].to_string();
    let task_id = captures[2].parse::<u32>().map_err(|e| {
        DistError::invalid_argument(format!(
            "Error parsing task name \"{}\": task id {}",
            task_name, e
        ))
    })?;

    Ok((job_name, task_id))
}

/// Whether `name` is usable as a job name
pub fn is_valid_job_name(name: &str) -> bool {
    JOB_NAME_RE.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat() {
        assert_eq!(concat_task_name("worker", 3), "/job:worker/task:3");
    }

    #[test]
    fn test_parse_with_device_suffix() {
        let (job, id) = parse_task_name("/job:ps/task:12/device:CPU:0").unwrap();
        assert_eq!(job, "ps");
        assert_eq!(id, 12);
    }

    #[test]
    fn test_parse_rejects_bad_names() {
        for name in [
            "",
            "/job:/task:0",
            "/job:1worker/task:0",
            "/job:worker/task:",
            "/job:worker/task:01",
            "/job:worker/task:-1",
            "/job:wor-ker/task:0",
            "job:worker/task:0",
            "/job:worker/task:0x",
        ] {
            let err = parse_task_name(name).unwrap_err();
            assert!(
                matches!(err, DistError::InvalidArgument { ref message } if message.contains(name)),
                "unexpected result for {:?}: {}",
                name,
                err
            );
        }
    }

    #[test]
    fn test_parse_rejects_overflow() {
        let err = parse_task_name("/job:worker/task:99999999999").unwrap_err();
        assert!(matches!(err, DistError::InvalidArgument { .. }));
    }

    #[test]
    fn test_job_name_validation() {
        assert!(is_valid_job_name("worker_0"));
        assert!(is_valid_job_name("A"));
        assert!(!is_valid_job_name("_worker"));
        assert!(!is_valid_job_name("9"));
        assert!(!is_valid_job_name(""));
    }
}
