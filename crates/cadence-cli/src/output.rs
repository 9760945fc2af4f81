//! Rendering for every `cadence` command.
//!
//! Commands hand a serializable value plus human renderers to
//! [`render_mode`] / [`render`]; JSON output is always the serde form of the
//! value, so the three modes never drift apart.
//!
//! Mode precedence: `--format`, then hidden `--json`, then `FORMAT`
//! (`pretty`, `text`, `json`; case-insensitive), then pretty on a terminal
//! and text when piped.

use std::io::{self, IsTerminal, Write};

use cadence_core::{ErrorCode, ValidationError};
use clap::ValueEnum;
use serde::Serialize;

/// Width of the rule under pretty section headings.
pub const RULE_WIDTH: usize = 72;

/// How command results are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Sectioned output for people at a terminal.
    Pretty,
    /// One fact per line, for pipes and scripts.
    Text,
    /// The serialized result.
    Json,
}

impl OutputMode {
    fn from_env_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn pick(flag: Option<Self>, json: bool, env: Option<&str>, tty: bool) -> Self {
        flag.or_else(|| json.then_some(Self::Json))
            .or_else(|| env.and_then(Self::from_env_value))
            .unwrap_or(if tty { Self::Pretty } else { Self::Text })
    }
}

/// Resolve the mode for this process from flags, `FORMAT` and stdout.
pub fn resolve_output_mode(flag: Option<OutputMode>, json: bool) -> OutputMode {
    let env = std::env::var("FORMAT").ok();
    OutputMode::pick(flag, json, env.as_deref(), io::stdout().is_terminal())
}

pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{}", "-".repeat(RULE_WIDTH))
}

/// Heading line plus rule.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// `key:` padded to a fixed column, then the value.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    let label = format!("{key}:");
    writeln!(w, "{label:<14} {}", value.as_ref())
}

/// Write `value` to stdout with separate text and pretty renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text(value, &mut out)?,
        OutputMode::Pretty => pretty(value, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

/// Write `value` to stdout; text and pretty share one renderer.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human: impl Fn(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    render_mode(mode, value, &human, &human)
}

/// A failure as reported to the user: message, optional stable code and
/// remediation hint.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_code: None,
            suggestion: None,
        }
    }

    pub fn coded(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_code: Some(code.code().to_string()),
            suggestion: code.hint().map(str::to_string),
        }
    }
}

impl From<&ValidationError> for CliError {
    fn from(err: &ValidationError) -> Self {
        Self::coded(err.code(), err.to_string())
    }
}

/// Write `error` to stderr: `{"error": {...}}` in JSON mode, otherwise
/// `error[CODE]: message` plus an indented suggestion.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let mut err = io::stderr().lock();
    if mode == OutputMode::Json {
        serde_json::to_writer_pretty(&mut err, &serde_json::json!({ "error": error }))?;
        writeln!(err)?;
        return Ok(());
    }

    let prefix = error
        .error_code
        .as_deref()
        .map_or_else(|| "error".to_string(), |code| format!("error[{code}]"));
    writeln!(err, "{prefix}: {}", error.message)?;
    if let Some(suggestion) = &error.suggestion {
        writeln!(err, "  suggestion: {suggestion}")?;
    }
    Ok(())
}
