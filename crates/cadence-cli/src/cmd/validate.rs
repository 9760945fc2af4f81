//! `cadence validate`: check a backlog document without planning it.

use std::io::Write;
use std::path::{Path, PathBuf};

use cadence_core::ErrorCode;
use cadence_core::config::resolve_config;
use cadence_core::model::BacklogDocument;
use cadence_core::validate::validate_inputs;
use clap::Args;
use serde::Serialize;

use crate::output::{CliError, OutputMode, render, render_error};

/// Arguments for `cadence validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Backlog document (JSON) to check.
    pub backlog: PathBuf,
}

#[derive(Debug, Serialize)]
struct ValidateOutput {
    valid: bool,
    items: usize,
    team: usize,
    total_points: u64,
}

/// Execute `cadence validate`.
pub fn run_validate(
    args: &ValidateArgs,
    config_path: Option<&Path>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let effective = match resolve_config(project_root, config_path) {
        Ok(effective) => effective,
        Err(e) => {
            let msg = format!("{e:#}");
            render_error(output, &CliError::coded(ErrorCode::ConfigParseError, &msg))?;
            anyhow::bail!("{msg}");
        }
    };

    let document = match BacklogDocument::load(&args.backlog) {
        Ok(document) => document,
        Err(e) => {
            let msg = format!("{e:#}");
            render_error(output, &CliError::new(&msg))?;
            anyhow::bail!("{msg}");
        }
    };

    if let Err(e) = validate_inputs(
        &document.items,
        &document.team,
        &effective.config.capacity_config(),
    ) {
        render_error(output, &CliError::from(&e))?;
        anyhow::bail!("{e}");
    }

    let summary = ValidateOutput {
        valid: true,
        items: document.items.len(),
        team: document.team.len(),
        total_points: document.items.iter().map(|item| u64::from(item.points)).sum(),
    };

    render(output, &summary, |s, w| {
        writeln!(
            w,
            "ok: {} items ({} pts), {} team members",
            s.items, s.total_points, s.team
        )
    })
}
