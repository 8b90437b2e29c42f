use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use lazymaint::cli::args::{Cli, Commands, ConfigAction, LogAction, OutputFormat};
use lazymaint::cli::output::{self, TerminalConfirm, TerminalReporter};
use lazymaint::common::config::{self, Config};
use lazymaint::common::safety;
use lazymaint::maintenance::Maintenance;
use lazymaint::progress::{Notice, Verbosity};
use lazymaint::retention;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config_path = cli.config_file.clone().unwrap_or_else(Config::config_path);
    let mut config = Config::load_from(&config_path)?;
    if let Some(ref home) = cli.home {
        config.kodi_home = Some(home.clone());
    }

    let _log_guard = init_tracing(cli.verbose, &config)?;

    match cli.command {
        Commands::Status => cmd_status(&cli, &config),

        Commands::SoftClean { budget_mb } => {
            if let Some(mb) = budget_mb {
                config.soft_clean_budget_mb = mb;
            }
            Ok(run_policy(&cli, &config, false, |m| m.soft_clean()))
        }

        Commands::AutoClean => Ok(run_policy(&cli, &config, false, |m| m.auto_clean())),

        Commands::HardClean { yes } => Ok(run_policy(&cli, &config, yes, |m| m.hard_clean())),

        Commands::Trim { ref path, budget_mb } => cmd_trim(&cli, path, budget_mb),

        Commands::Backup {
            ref name,
            ref dest,
            yes,
        } => {
            let dest = dest
                .clone()
                .or_else(|| config.backup_dir.clone())
                .context("No backup destination: pass --dest or set backup_dir")?;
            Ok(run_policy(&cli, &config, yes, |m| m.backup(name.as_deref(), &dest)))
        }

        Commands::Restore { ref archive, yes } => {
            Ok(run_policy(&cli, &config, yes, |m| m.restore(archive)))
        }

        Commands::FreshStart { yes } => Ok(run_policy(&cli, &config, yes, |m| m.fresh_start())),

        Commands::Log { ref action } => match action {
            LogAction::Read => {
                let reporter = TerminalReporter::new(cli.format.clone(), Verbosity::Silent);
                let confirm = TerminalConfirm { assume_yes: true };
                let maintenance = Maintenance::new(config.host_paths(), &config, &reporter, &confirm);
                let text = maintenance.read_log().context("No log file found")?;
                print!("{}", text);
                Ok(ExitCode::SUCCESS)
            }
            LogAction::Export { dest } => {
                Ok(run_policy(&cli, &config, true, |m| m.export_log(dest)))
            }
            LogAction::Clear => Ok(run_policy(&cli, &config, false, |m| m.clear_log())),
        },

        Commands::Config { action } => cmd_config(action, &config_path),

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            let shell = match shell {
                lazymaint::cli::args::CompletionShell::Bash => clap_complete::Shell::Bash,
                lazymaint::cli::args::CompletionShell::Zsh => clap_complete::Shell::Zsh,
                lazymaint::cli::args::CompletionShell::Fish => clap_complete::Shell::Fish,
            };
            clap_complete::generate(shell, &mut cmd, "lazymaint", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Stderr logging with `--verbose` or `RUST_LOG`, plus a file log when configured
fn init_tracing(verbose: bool, config: &Config) -> Result<Option<WorkerGuard>> {
    let stderr_filter = if verbose {
        Some(EnvFilter::new("lazymaint=debug"))
    } else {
        EnvFilter::try_from_default_env().ok()
    };
    let stderr_layer = stderr_filter.map(|filter| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter)
    });

    let (file_layer, guard) = match config.log_file {
        Some(ref path) => {
            let dir = path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log dir: {}", dir.display()))?;
            let file_name = path
                .file_name()
                .context("log_file must name a file")?
                .to_owned();
            let appender = tracing_appender::rolling::never(&dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new("lazymaint=info"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

fn verbosity(cli: &Cli, config: &Config) -> Verbosity {
    if cli.quiet {
        Verbosity::Silent
    } else {
        config.verbosity
    }
}

/// Run one policy with terminal reporting; failure notices become a failing exit code
fn run_policy<F>(cli: &Cli, config: &Config, assume_yes: bool, policy: F) -> ExitCode
where
    F: FnOnce(&Maintenance) -> Notice,
{
    let reporter = TerminalReporter::new(cli.format.clone(), verbosity(cli, config));
    let confirm = TerminalConfirm { assume_yes };
    let maintenance = Maintenance::new(config.host_paths(), config, &reporter, &confirm);

    let notice = policy(&maintenance);
    if notice.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// ─── Status ───────────────────────────────────────────────────────────────────

fn cmd_status(cli: &Cli, config: &Config) -> Result<ExitCode> {
    let reporter = TerminalReporter::new(cli.format.clone(), Verbosity::Silent);
    let confirm = TerminalConfirm { assume_yes: false };
    let maintenance = Maintenance::new(config.host_paths(), config, &reporter, &confirm);
    let usage = maintenance.status();

    match cli.format {
        OutputFormat::Human => output::print_status(&usage, config.soft_clean_budget_bytes()),
        OutputFormat::Json => output::print_status_json(&usage),
        OutputFormat::Quiet => {
            for dir in &usage {
                println!("{}  {}", dir.size_bytes, dir.path.display());
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ─── Trim ─────────────────────────────────────────────────────────────────────

fn cmd_trim(cli: &Cli, path: &std::path::Path, budget_mb: u64) -> Result<ExitCode> {
    safety::guard(path)?;
    let budget = config::mb_to_bytes(budget_mb);
    let report = retention::trim(path, budget);

    match cli.format {
        OutputFormat::Human => output::print_trim_report(&report, budget),
        OutputFormat::Json => output::print_trim_json(&report, budget),
        OutputFormat::Quiet => {
            println!(
                "{}  {}  {}",
                report.size_after, report.files_removed, report.bytes_freed
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ─── Config ───────────────────────────────────────────────────────────────────

fn cmd_config(action: ConfigAction, path: &std::path::Path) -> Result<ExitCode> {
    match action {
        ConfigAction::Init => {
            Config::default().save_to(path)?;
            println!("  {} Config written to {}", "✓".green(), path.display());
        }
        ConfigAction::Show => {
            let config = Config::load_from(path)?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Reset => {
            Config::default().save_to(path)?;
            println!("  {} Configuration reset to defaults", "✓".green());
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(path)?;
            config.set(&key, &value)?;
            config.save_to(path)?;
            println!("  {} Set {} = {}", "✓".green(), key, value);
        }
    }
    Ok(ExitCode::SUCCESS)
}
