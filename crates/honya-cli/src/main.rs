mod cli;
mod display;

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use honya_api::{collect_pages, resolve_links, Downloader, WnacgClient};
use honya_core::assemble::{self, SearchOptions, SearchOutcome};
use honya_core::config::AppConfig;
use honya_core::models::{Export, SaveLayout, SearchKind};
use honya_core::storage;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Command, SearchArgs};

/// Install the stderr subscriber and, when enabled, a daily log file.
///
/// The returned guard flushes the file writer on drop.
fn init_tracing(config: &AppConfig, verbose: bool) -> Option<WorkerGuard> {
    let default = if verbose {
        "honya=debug,honya_core=debug,honya_api=debug"
    } else {
        "honya=info,honya_core=info,honya_api=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into());

    let (file_layer, guard) = if config.general.log_to_file {
        let appender = tracing_appender::rolling::daily(AppConfig::data_dir().join("logs"), "honya.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => AppConfig::load().context("failed to load config"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    let _guard = init_tracing(&config, cli.verbose);

    match run(cli.command, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: AppConfig) -> Result<ExitCode> {
    match command {
        Command::Search(args) => search(args, &config).await?,
        Command::Shelves => shelves(&config).await?,
        Command::Shelf { id, links } => shelf(id, links, &config).await?,
        Command::Links { target } => links(&target, &config).await?,
        Command::Download { file } => download(&file, &config).await?,
        Command::Files => files(&config)?,
        Command::Config { check, init } => return config_command(check, init, &config),
    }
    Ok(ExitCode::SUCCESS)
}

// ── Search ──────────────────────────────────────────────────────

async fn search(args: SearchArgs, config: &AppConfig) -> Result<()> {
    let mut options = SearchOptions::from_config(config);
    options.show_all = args.all;
    if let Some(max_pages) = args.max_pages {
        options.max_pages = max_pages;
    }
    if let Some(min) = args.min_similarity {
        if !(0.0..=1.0).contains(&min) {
            bail!("--min-similarity must be within [0, 1], got {min}");
        }
        options.min_similarity = min;
    }
    let kind = if args.tag {
        SearchKind::Tag
    } else {
        SearchKind::Keyword
    };

    let client = WnacgClient::new(config)?;
    let delay = Duration::from_millis(config.request.page_delay_ms);
    let candidates = collect_pages(&client, kind, &args.query, options.max_pages, delay).await;

    let outcome = assemble::search(&args.query, kind, candidates, options);
    print!(
        "{}",
        display::render_outcome(&outcome, &args.query, options.min_similarity)
    );

    if args.save {
        match &outcome {
            SearchOutcome::Matches(set) => {
                let layout = if args.grouped {
                    SaveLayout::Grouped
                } else {
                    SaveLayout::All
                };
                let exports = set.exports(layout);
                let paths = storage::save_search(&config.search_results_dir(), &args.query, &exports)?;
                for path in paths {
                    println!("Saved {}", path.display());
                }
            }
            _ => println!("Nothing to save."),
        }
    }

    Ok(())
}

// ── Shelves ─────────────────────────────────────────────────────

async fn shelves(config: &AppConfig) -> Result<()> {
    let client = WnacgClient::new(config)?;
    let shelves = client.shelves().await?;
    print!("{}", display::render_shelves(&shelves));
    Ok(())
}

async fn shelf(id: u64, with_links: bool, config: &AppConfig) -> Result<()> {
    let client = WnacgClient::new(config)?;
    let comics = client.shelf_comics(id).await?;
    let mut export = Export::from_shelf(id, comics);

    let path = storage::save_shelf(&config.search_results_dir(), &export)?;
    println!("Saved {} comics to {}", export.total_comics, path.display());

    if with_links {
        let resolved = resolve_with(&client, &mut export, config).await;
        let enriched = storage::save_enriched(&config.downloads_dir(), &path, &export)?;
        println!(
            "{resolved}/{} comics have download links, saved to {}",
            export.total_comics,
            enriched.display()
        );
    }
    Ok(())
}

// ── Links ───────────────────────────────────────────────────────

async fn resolve_with(client: &WnacgClient, export: &mut Export, config: &AppConfig) -> usize {
    resolve_links(
        client,
        &mut export.comics,
        config.request.batch_size,
        Duration::from_secs(config.request.delay_between_requests_secs),
    )
    .await
}

async fn links(target: &str, config: &AppConfig) -> Result<()> {
    let client = WnacgClient::new(config)?;

    if let Ok(id) = target.parse::<u64>() {
        let links = client.download_links(id).await?;
        if links.is_empty() {
            println!("No download links for {id}.");
        }
        for (name, link) in links.iter() {
            println!("{name}: {}", link.url);
        }
        return Ok(());
    }

    let path = Path::new(target);
    let mut export = storage::load_export(path)?;
    if export.comics.is_empty() {
        bail!("{} has no comics", path.display());
    }
    let resolved = resolve_with(&client, &mut export, config).await;
    let enriched = storage::save_enriched(&config.downloads_dir(), path, &export)?;
    println!(
        "{resolved}/{} comics have download links, saved to {}",
        export.comics.len(),
        enriched.display()
    );
    Ok(())
}

// ── Downloads ───────────────────────────────────────────────────

async fn download(file: &Path, config: &AppConfig) -> Result<()> {
    let export = storage::load_export(file)?;
    let downloader = Downloader::new(config.archives_dir(), &config.site.user_agent)?;
    println!("Downloading into {}", downloader.dir().display());
    let summary = downloader.download_export(&export).await?;
    print!("{}", display::render_download_summary(&summary));
    Ok(())
}

// ── Files / config ──────────────────────────────────────────────

fn files(config: &AppConfig) -> Result<()> {
    let searches = storage::scan_exports(&config.search_results_dir())?;
    print!("{}", display::render_files("Exports", &searches));
    let enriched = storage::scan_exports(&config.downloads_dir())?;
    print!("{}", display::render_files("With download links", &enriched));
    Ok(())
}

fn config_command(check: bool, init: bool, config: &AppConfig) -> Result<ExitCode> {
    let path = AppConfig::config_path();
    if init {
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        AppConfig::default().save()?;
        println!("Wrote defaults to {}", path.display());
    } else {
        println!("Config file: {}", path.display());
        println!("Data directory: {}", AppConfig::data_dir().display());
    }

    if check {
        let problems = config.validate();
        if problems.is_empty() {
            println!("Config OK.");
        } else {
            for problem in &problems {
                println!("- {problem}");
            }
            return Ok(ExitCode::FAILURE);
        }
    }
    Ok(ExitCode::SUCCESS)
}
