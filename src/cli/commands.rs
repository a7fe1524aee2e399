//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::render::{layout_lines, log_lines, pruned_lines, TreeRender};
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{fit_width, Outcome};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    if let Commands::Completion { shell } = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref())?;
    let container = ServiceContainer::new(settings);

    match &cli.command {
        Commands::Export { script, output } => cmd_export(&container, script, output.as_deref()),
        Commands::Layout { script, width } => cmd_layout(&container, script, *width),
        Commands::Tree { script } => cmd_tree(&container, script),
        Commands::Log { script, limit } => cmd_log(&container, script, *limit),
        Commands::Pruned { script } => cmd_pruned(&container, script),
        Commands::Check { script } => cmd_check(&container, script),
        Commands::Config { command } => cmd_config(&container, command),
        Commands::Completion { .. } => Ok(()),
    }
}

#[instrument(skip(container))]
fn cmd_export(container: &ServiceContainer, script: &Path, out: Option<&Path>) -> CliResult<()> {
    let replay = container.replay(script)?;
    let markdown = replay.session.state().to_markdown();
    match out {
        Some(path) => {
            if container.fs.exists(path) {
                debug!("overwriting {}", path.display());
            }
            container
                .fs
                .write(path, &markdown)
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("exported to {}", path.display()));
        }
        None => print!("{}", markdown),
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_layout(container: &ServiceContainer, script: &Path, width: Option<f64>) -> CliResult<()> {
    let replay = container.replay(script)?;
    let state = replay.session.state();
    let settings = &container.settings.layout;

    let width = match width {
        Some(w) if !w.is_finite() || w <= 0.0 => {
            return Err(CliError::InvalidArgs(format!("width must be positive, got {}", w)));
        }
        Some(w) => w,
        None => fit_width(state.visible_count(), settings.min_width, settings.width_per_node),
    };
    debug!("layout width: {}", width);

    let layout = settings.engine().compute(state.nodes(), state.root(), width);
    output::header(&format!(
        "{} nodes, {} edges, width {:.1}",
        layout.len(),
        layout.edges(state.nodes()).len(),
        width
    ));
    for line in layout_lines(state, &layout) {
        output::info(&line);
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, script: &Path) -> CliResult<()> {
    let replay = container.replay(script)?;
    output::info(&replay.session.to_term_tree());
    Ok(())
}

#[instrument(skip(container))]
fn cmd_log(container: &ServiceContainer, script: &Path, limit: Option<usize>) -> CliResult<()> {
    let replay = container.replay(script)?;
    let limit = limit.unwrap_or(container.settings.log.recent_entries);
    for line in log_lines(replay.session.state(), limit) {
        output::info(&line);
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_pruned(container: &ServiceContainer, script: &Path) -> CliResult<()> {
    let replay = container.replay(script)?;
    let lines = pruned_lines(replay.session.state());
    if lines.is_empty() {
        output::info(&"no pruned nodes");
        return Ok(());
    }
    output::header(&format!("{} pruned subtrees", lines.len()));
    for line in lines {
        output::detail(&line);
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_check(container: &ServiceContainer, script: &Path) -> CliResult<()> {
    let replay = container.replay(script)?;
    let state = replay.session.state();

    output::header(&format!("{} steps", replay.reports.len()));
    for report in &replay.reports {
        match &report.result {
            Ok(Outcome::Applied) => output::success_detail(&report.step),
            Ok(Outcome::Ignored(reason)) => {
                output::skipped(&format!("{}: ignored ({})", report.step, reason))
            }
            Err(e) => output::failure(&format!("{}: {}", report.step, e)),
        }
    }

    state.check_invariants().map_err(ApplicationError::from)?;
    output::success(&format!(
        "invariants hold: {} nodes, {} visible, {} log entries",
        state.nodes().len(),
        state.visible_count(),
        state.log().len()
    ));
    if replay.failures().count() > 0 {
        output::warning(&format!("{} steps failed", replay.failures().count()));
    }
    Ok(())
}

fn cmd_config(container: &ServiceContainer, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => output::warning("no config directory available on this platform"),
        },
    }
    Ok(())
}
