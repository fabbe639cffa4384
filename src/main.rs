use clap::{Parser, Subcommand};
use m3u_mirror::config::validate_config_file;
use m3u_mirror::logging::{self, DEFAULT_KEEP};
use m3u_mirror::{Config, Result, RunReport, Scraper};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "m3u-mirror")]
#[command(version)]
#[command(about = "Mirror M3U channel logos and publish a rewritten playlist", long_about = None)]
struct Cli {
    /// The config file
    #[arg(short = 'c', long = "config", default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch, mirror and write the playlist and report (default)
    Run,
    /// Fetch and parse the playlist, mirror a few logos, write nothing
    Test {
        /// Number of channels whose logos are mirrored
        #[arg(long, default_value_t = 3)]
        sample: usize,
    },
    /// Print the report of the last run
    Analyze {
        /// Report file, defaults to stats.json in the output directory
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Check the config file
    Validate,
    /// Delete old log files
    Clean {
        /// Number of newest log files to keep
        #[arg(long, default_value_t = DEFAULT_KEEP)]
        keep: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Run);

    match execute(&cli.config, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "{} failed", e.stage());
            eprintln!("{} failed: {}", e.stage(), e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(config_path: &Path, command: Command) -> Result<()> {
    if let Command::Validate = command {
        let config = validate_config_file(config_path)?;
        println!("Configuration is valid: {}", config_path.display());
        println!("  source_url: {}", config.source_url);
        if let Some(base) = config.logo_base_url() {
            println!("  logo base URL: {base}");
        }
        println!("  playlist: {}", config.playlist_path().display());
        return Ok(());
    }

    let config = Config::load(config_path)?;
    if let Some(path) = logging::init_tracing(&config.paths.logs_dir) {
        tracing::debug!(path = %path.display(), "logging to file");
    }

    match command {
        Command::Run => {
            let summary = Scraper::new(config)?.run().await?;
            println!(
                "Processed {} channels, {} logos ({:.1}% coverage)",
                summary.report.total_channels,
                summary.report.channels_with_logos,
                summary.report.logo_coverage_percent
            );
            println!(
                "Logos: {} downloaded, {} already mirrored, {} failed, {} without logo",
                summary.mirror.downloaded,
                summary.mirror.hits,
                summary.mirror.failed,
                summary.mirror.skipped
            );
            println!("Playlist: {}", summary.playlist_path.display());
            println!("Report: {}", summary.report_path.display());
        }
        Command::Test { sample } => {
            let summary = Scraper::new(config)?.smoke_test(sample).await?;
            println!("Fetched {} characters", summary.fetched_chars);
            println!("Parsed {} channels", summary.parsed_channels);
            let mirrored = summary.sampled.iter().filter(|c| c.has_local_logo()).count();
            println!("Mirrored {}/{} sample logos", mirrored, summary.sampled.len());
            println!("All checks passed");
        }
        Command::Analyze { report } => {
            let path = report.unwrap_or_else(|| config.report_path());
            let report = RunReport::load(&path).await?;
            println!("{}", report.render_summary());
        }
        Command::Clean { keep } => {
            let removed = logging::prune_logs(&config.paths.logs_dir, keep)?;
            println!("Removed {} old log file(s)", removed.len());
        }
        Command::Validate => {}
    }

    Ok(())
}
