//! Plan generator boundary.
//!
//! Generation is delegated to an external script that takes its inputs as
//! argv and answers with one JSON document on stdout; stderr is a log
//! channel, not a failure signal, except for lines that look like real
//! errors. `PlanGenerator` keeps that process behind a trait so the
//! orchestrator and handlers can run against fakes.

use std::process::Stdio;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::config::Config;
use crate::errors::AppError;

/// Harmless gRPC teardown chatter some generator builds print on stderr at
/// exit. It matches the fatal pattern, so it gets its own carve-out: the run
/// still counts as a success as long as stdout carried a payload.
pub const GRPC_SHUTDOWN_NEEDLE: &str = "grpc_wait_for_shutdown_with_timeout() timed out";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Full phased timeline ("ai" code path).
    Timeline,
    /// Plan plus Mermaid chart, no persistence.
    Plan,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub current_skills: Vec<String>,
    pub target_job: String,
    pub timeframe_months: i64,
    pub additional_context: Option<Value>,
    pub mode: GenerationMode,
}

#[async_trait]
pub trait PlanGenerator: Send + Sync {
    /// Runs one generation and returns the parsed payload.
    async fn generate(&self, request: &GenerationRequest) -> Result<Value, AppError>;
}

/// Production generator: spawns the configured interpreter + script per
/// request. No pooling, no concurrency cap, no timeout; each request owns
/// its child process from spawn to exit.
pub struct ProcessGenerator {
    python_bin: String,
    timeline_script: String,
    plan_script: String,
}

impl ProcessGenerator {
    pub fn new(config: &Config) -> Self {
        ProcessGenerator {
            python_bin: config.python_bin.clone(),
            timeline_script: config.timeline_script.clone(),
            plan_script: config.plan_script.clone(),
        }
    }

    /// Script path and argv for a request.
    ///
    /// Timeline mode: `[skills_json, target_job, timeframe, context_json, "ai"]`
    /// with the context defaulting to `{}`. Plan mode stops after the
    /// timeframe. The receiving scripts position-match, so order is load-bearing.
    fn command_line(
        &self,
        request: &GenerationRequest,
    ) -> Result<(&str, Vec<String>), serde_json::Error> {
        let mut args = vec![
            serde_json::to_string(&request.current_skills)?,
            request.target_job.clone(),
            request.timeframe_months.to_string(),
        ];

        let script = match request.mode {
            GenerationMode::Timeline => {
                let context = match &request.additional_context {
                    Some(value) => serde_json::to_string(value)?,
                    None => "{}".to_string(),
                };
                args.push(context);
                args.push("ai".to_string());
                self.timeline_script.as_str()
            }
            GenerationMode::Plan => self.plan_script.as_str(),
        };

        Ok((script, args))
    }

    async fn run(&self, script: &str, args: &[String]) -> Result<Value, AppError> {
        let mut child = Command::new(&self.python_bin)
            .arg(script)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AppError::GeneratorProcess(format!("failed to spawn generator: {e}")))?;

        let stdout_pipe = child
            .stdout
            .take()
            .ok_or_else(|| AppError::GeneratorProcess("generator stdout unavailable".into()))?;
        let stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| AppError::GeneratorProcess("generator stderr unavailable".into()))?;

        // Drain stderr concurrently so a chatty script cannot deadlock the
        // pipe while we wait on stdout.
        let stderr_task = tokio::spawn(async move {
            let mut fatal = String::new();
            let mut lines = BufReader::new(stderr_pipe).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("generator stderr: {line}");
                if is_fatal_stderr(&line) {
                    fatal.push_str(&line);
                    fatal.push('\n');
                }
            }
            fatal
        });

        let mut stdout = String::new();
        BufReader::new(stdout_pipe)
            .read_to_string(&mut stdout)
            .await
            .map_err(|e| AppError::GeneratorProcess(format!("failed to read generator output: {e}")))?;

        let status = child
            .wait()
            .await
            .map_err(|e| AppError::GeneratorProcess(format!("failed to await generator: {e}")))?;
        let fatal = stderr_task.await.unwrap_or_default();

        triage(status.code(), &fatal, &stdout)?;
        parse_payload(&stdout)
    }
}

#[async_trait]
impl PlanGenerator for ProcessGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value, AppError> {
        let (script, args) = self
            .command_line(request)
            .map_err(anyhow::Error::from)?;
        debug!("invoking generator: {} {script}", self.python_bin);
        self.run(script, &args).await
    }
}

/// A stderr line is fatal when it carries an error or exception marker.
/// Everything else is progress logging.
fn is_fatal_stderr(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("error:") || lower.contains("exception:")
}

/// Exit triage. A nonzero exit or a non-empty fatal buffer fails the run,
/// unless the buffer matched the benign gRPC needle and stdout is non-empty.
fn triage(exit_code: Option<i32>, fatal: &str, stdout: &str) -> Result<(), AppError> {
    let failed = exit_code != Some(0) || !fatal.is_empty();
    let benign = fatal.contains(GRPC_SHUTDOWN_NEEDLE) && !stdout.is_empty();

    if failed && !benign {
        let detail = if fatal.is_empty() {
            match exit_code {
                Some(code) => format!("generator exited with status {code}"),
                None => "generator was terminated by a signal".to_string(),
            }
        } else {
            fatal.trim_end().to_string()
        };
        return Err(AppError::GeneratorProcess(detail));
    }
    Ok(())
}

fn parse_payload(stdout: &str) -> Result<Value, AppError> {
    serde_json::from_str(stdout.trim()).map_err(|_| AppError::GeneratorContract {
        message: "Invalid response from timeline generator".to_string(),
        payload: stdout.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn generator() -> ProcessGenerator {
        ProcessGenerator {
            python_bin: "python3".to_string(),
            timeline_script: "scripts/generate_timeline.py".to_string(),
            plan_script: "scripts/generate_plan.py".to_string(),
        }
    }

    fn request(mode: GenerationMode) -> GenerationRequest {
        GenerationRequest {
            current_skills: vec!["Python".to_string(), "SQL".to_string()],
            target_job: "Data Engineer".to_string(),
            timeframe_months: 6,
            additional_context: None,
            mode,
        }
    }

    #[test]
    fn test_timeline_argv_order_and_mode_flag() {
        let generator = generator();
        let (script, args) = generator
            .command_line(&request(GenerationMode::Timeline))
            .unwrap();
        assert_eq!(script, "scripts/generate_timeline.py");
        assert_eq!(
            args,
            vec![
                r#"["Python","SQL"]"#,
                "Data Engineer",
                "6",
                "{}",
                "ai",
            ]
        );
    }

    #[test]
    fn test_timeline_argv_serializes_context() {
        let mut req = request(GenerationMode::Timeline);
        req.additional_context = Some(json!({"budget": "low"}));
        let (_, args) = generator().command_line(&req).unwrap();
        assert_eq!(args[3], r#"{"budget":"low"}"#);
    }

    #[test]
    fn test_plan_argv_has_no_context_or_mode() {
        let generator = generator();
        let (script, args) = generator
            .command_line(&request(GenerationMode::Plan))
            .unwrap();
        assert_eq!(script, "scripts/generate_plan.py");
        assert_eq!(args, vec![r#"["Python","SQL"]"#, "Data Engineer", "6"]);
    }

    #[test]
    fn test_fatal_stderr_markers() {
        assert!(is_fatal_stderr("ValueError: bad input"));
        assert!(is_fatal_stderr("Unhandled EXCEPTION: boom"));
        assert!(!is_fatal_stderr("INFO: calling model"));
        assert!(!is_fatal_stderr("progress 3/5"));
    }

    #[test]
    fn test_triage_clean_exit_passes() {
        assert!(triage(Some(0), "", "{}").is_ok());
    }

    #[test]
    fn test_triage_nonzero_exit_fails() {
        let err = triage(Some(1), "", "{}").unwrap_err();
        assert!(matches!(err, AppError::GeneratorProcess(_)));
    }

    #[test]
    fn test_triage_fatal_stderr_fails_despite_exit_zero() {
        let err = triage(Some(0), "RuntimeError: no api key\n", "{}").unwrap_err();
        match err {
            AppError::GeneratorProcess(msg) => assert!(msg.contains("no api key")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_triage_grpc_needle_is_benign_with_output() {
        let fatal = format!("E0000 gc error: {GRPC_SHUTDOWN_NEEDLE}\n");
        assert!(triage(Some(0), &fatal, r#"{"plan": []}"#).is_ok());
        // A nonzero exit is also forgiven when the payload made it out.
        assert!(triage(Some(1), &fatal, r#"{"plan": []}"#).is_ok());
    }

    #[test]
    fn test_triage_grpc_needle_still_fails_without_output() {
        let fatal = format!("error: {GRPC_SHUTDOWN_NEEDLE}\n");
        assert!(triage(Some(0), &fatal, "").is_err());
    }

    #[test]
    fn test_triage_signal_exit_reports_signal() {
        let err = triage(None, "", "").unwrap_err();
        match err {
            AppError::GeneratorProcess(msg) => assert!(msg.contains("signal")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_payload_accepts_json() {
        let value = parse_payload(r#" {"plan": [1, 2]} "#).unwrap();
        assert_eq!(value["plan"][0], 1);
    }

    #[test]
    fn test_parse_payload_rejects_non_json_even_on_clean_exit() {
        let err = parse_payload("Here is your plan!").unwrap_err();
        match err {
            AppError::GeneratorContract { payload, .. } => {
                assert_eq!(payload, "Here is your plan!");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
