use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use cadence_core::ErrorCode;
use cadence_core::config::{ConfigSource, EffectiveConfig, PlanConfig, resolve_config};
use cadence_core::validate::validate_config;
use clap::Args;

use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render_error, render_mode};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Show the built-in defaults instead of the resolved configuration.
    #[arg(long)]
    defaults: bool,
}

pub fn run_config(
    args: &ConfigArgs,
    config_path: Option<&Path>,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let effective = if args.defaults {
        EffectiveConfig {
            config: PlanConfig::default(),
            source: ConfigSource::Defaults,
        }
    } else {
        match resolve_config(project_root, config_path) {
            Ok(effective) => effective,
            Err(e) => {
                let msg = format!("{e:#}");
                render_error(output, &CliError::coded(ErrorCode::ConfigParseError, &msg))?;
                anyhow::bail!("{msg}");
            }
        }
    };

    if let Err(e) = validate_config(&effective.config.capacity_config()) {
        render_error(output, &CliError::from(&e))?;
        anyhow::bail!("{e}");
    }

    let toml = effective.config.to_toml_string()?;
    render_mode(
        output,
        &effective,
        |value, w| {
            writeln!(w, "# source: {}", describe_source(&value.source))?;
            write!(w, "{toml}")
        },
        |value, w| render_pretty(value, &toml, w),
    )
}

fn describe_source(source: &ConfigSource) -> String {
    match source {
        ConfigSource::Explicit(path) => format!("explicit {}", path.display()),
        ConfigSource::Project(path) => format!("project {}", path.display()),
        ConfigSource::User(path) => format!("user {}", path.display()),
        ConfigSource::Defaults => "built-in defaults".to_string(),
    }
}

fn render_pretty(effective: &EffectiveConfig, toml: &str, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Effective configuration")?;
    pretty_kv(w, "Source", describe_source(&effective.source))?;
    writeln!(w)?;
    write!(w, "{toml}")
}
