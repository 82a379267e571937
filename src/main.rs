use anyhow::{Context, Result};
use asb_audit::cache::SnapshotFile;
use asb_audit::classify::classify;
use asb_audit::cli::{Cli, Commands};
use asb_audit::error::user_friendly_error;
use asb_audit::gerrit::{Change, ChangeSource, GerritClient};
use asb_audit::presence::{GitBackend, PresenceChecker, RepoPathMapper};
use asb_audit::report::{write_topic_list, ReportBuilder};
use asb_audit::{Config, ExclusionPolicy};
use clap::Parser;
use std::io;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        debug!("{:?}", e);
        user_friendly_error(&e).display();
        std::process::exit(1);
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // stdout is reserved for the report
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    info!("Loading configuration");
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(query) = &cli.query {
        config.gerrit.query = query.clone();
    }
    if let Some(cache_file) = &cli.cache_file {
        config.audit.cache_file = cache_file.clone();
    }

    let policy = ExclusionPolicy::from_config(&config)?;
    let changes = load_changes(cli, &config)?;

    eprintln!("Filtering changes by topic...");
    let groups = classify(&changes, policy.bulletin_pattern());

    match cli.command {
        Some(Commands::ListTopics) => write_topic_list(&groups, &policy, io::stdout().lock()),
        None => {
            eprintln!("Iterating through {} ASB topics...", groups.len());
            let mut checker = PresenceChecker::new(
                &policy,
                RepoPathMapper::from_settings(&config.audit),
                GitBackend,
            );

            let summary = ReportBuilder::new(&policy, io::stdout().lock())
                .build(&groups, &mut checker)?;

            if !checker.warnings().is_empty() {
                warn!(
                    "{} change(s) could not be verified because their repository is missing",
                    checker.warnings().len()
                );
            }
            info!("Merged {} of {} changes", summary.merged, summary.total);
            Ok(())
        }
    }
}

/// Fetch the change list, or replay the snapshot when asked to
fn load_changes(cli: &Cli, config: &Config) -> Result<Vec<Change>> {
    let snapshot = SnapshotFile::new(&config.audit.cache_file);

    let source = if cli.no_download {
        eprintln!("Using cached version of changes...");
        ChangeSource::Snapshot(snapshot.clone())
    } else {
        eprintln!("Getting changes from Gerrit...");
        ChangeSource::Live(GerritClient::new(&config.gerrit)?)
    };

    let changes = source.fetch(&config.gerrit.query)?;

    if source.is_live() {
        eprintln!("Got {} changes...", changes.len());
        eprintln!("Writing changes as json to {:?}...", snapshot.path());
        snapshot.save(&changes)?;
    }

    Ok(changes)
}
