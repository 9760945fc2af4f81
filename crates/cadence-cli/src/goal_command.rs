//! Goal generation through an external program.
//!
//! The program receives one [`GoalRequest`] as JSON on stdin and must print
//! exactly `{"goal": "..."}` on stdout. Anything else (non-zero exit,
//! malformed JSON, extra fields) counts as a failed attempt and the
//! iteration keeps its fallback goal.

use std::process::Stdio;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use cadence_plan::GoalRequest;
use cadence_plan::GoalTextGenerator;
use cadence_plan::goal::parse_goal_payload;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Runs `program args...` once per iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandGoalGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGoalGenerator {
    /// Split a command line on whitespace. Returns `None` for a blank line.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[async_trait]
impl GoalTextGenerator for CommandGoalGenerator {
    async fn generate(&self, request: &GoalRequest) -> Result<String> {
        let input = serde_json::to_vec(request).context("serialize goal request")?;

        debug!(program = %self.program, sequence = request.sequence, "running goal command");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawn goal command '{}'", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&input)
                .await
                .context("write goal request to stdin")?;
            // Dropping stdin closes the pipe so the program sees EOF.
        }

        let output = child
            .wait_with_output()
            .await
            .context("wait for goal command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "goal command exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8(output.stdout).context("goal command output is not UTF-8")?;
        let payload = parse_goal_payload(&stdout)?;
        Ok(payload.goal)
    }
}
