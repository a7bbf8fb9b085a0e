use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use tsslice::{
    Cursor, Engine, EngineConfig, FileQuery, Granularity, Warning, WindowRequest,
};

#[derive(Parser)]
#[command(name = "tsslice", version, about = "Windowed reads over partitioned CSV market data")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dataset root (overrides the configured root)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the asset-class/granularity directory skeleton
    Bootstrap,
    /// List partition files in date order
    Files {
        #[arg(long)]
        asset: String,
        #[arg(long)]
        granularity: Granularity,
        #[arg(long)]
        symbol: Option<String>,
        /// First date directory (yyyyMMdd)
        #[arg(long)]
        start: Option<String>,
        /// Last date directory (yyyyMMdd)
        #[arg(long)]
        end: Option<String>,
    },
    /// Count records (exact for 1d, size-based estimate otherwise)
    Count {
        #[arg(long)]
        granularity: Granularity,
        #[arg(long)]
        symbol: Option<String>,
        files: Vec<PathBuf>,
    },
    /// Read one window; pass the returned cursor back to continue
    Window {
        #[arg(long)]
        granularity: Granularity,
        /// Records per window (0 = granularity cap)
        #[arg(long, default_value_t = 0)]
        budget: usize,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// Token from a previous window; replaces FILES
        #[arg(long)]
        cursor: Option<String>,
        files: Vec<PathBuf>,
    },
    /// Collect daily bars and return one index page
    DayRange {
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Lines to return (0 = up to the cap)
        #[arg(long, default_value_t = 0)]
        limit: usize,
        files: Vec<PathBuf>,
    },
}

#[derive(Serialize)]
struct WindowOutput {
    lines: Vec<String>,
    matched: usize,
    cursor: String,
    remaining_files: usize,
    last: bool,
    warnings: Vec<Warning>,
}

#[derive(Serialize)]
struct DayRangeOutput {
    total_lines: usize,
    offset: usize,
    text: String,
    warnings: Vec<Warning>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(root) = cli.root {
        config.root = root;
    }
    let engine = Engine::new(config);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Bootstrap => {
            let created = engine.bootstrap().context("bootstrap failed")?;
            info!(
                "created {} directories under {}",
                created.len(),
                engine.config().root.display()
            );
            serde_json::to_writer_pretty(&mut out, &created)?;
        }
        Commands::Files {
            asset,
            granularity,
            symbol,
            start,
            end,
        } => {
            let query = FileQuery {
                asset_class: asset,
                granularity,
                symbol,
                start_date: start,
                end_date: end,
            };
            let files = engine.discover(&query).context("file discovery failed")?;
            info!("found {} files", files.len());
            serde_json::to_writer_pretty(&mut out, &files)?;
        }
        Commands::Count {
            granularity,
            symbol,
            files,
        } => {
            let estimate = engine.estimate_count(&files, granularity, symbol.as_deref());
            serde_json::to_writer_pretty(&mut out, &estimate)?;
        }
        Commands::Window {
            granularity,
            budget,
            symbol,
            start,
            end,
            cursor,
            files,
        } => {
            let mut request = WindowRequest::new(granularity, files)
                .budget(budget)
                .range(start.as_deref(), end.as_deref());
            if let Some(symbol) = symbol {
                request = request.symbol(symbol);
            }
            if let Some(token) = cursor {
                request = request.resume(Cursor::from_token(&token).context("bad --cursor")?);
            }
            let window = engine.get_window(&request)?;
            let output = WindowOutput {
                cursor: window.cursor.to_token()?,
                remaining_files: window.remaining_files().len(),
                last: window.is_last(),
                lines: window.lines,
                matched: window.matched,
                warnings: window.warnings,
            };
            serde_json::to_writer_pretty(&mut out, &output)?;
        }
        Commands::DayRange {
            symbol,
            start,
            end,
            offset,
            limit,
            files,
        } => {
            let day = engine.collect_day_text(
                &files,
                symbol.as_deref(),
                start.as_deref(),
                end.as_deref(),
            );
            let output = DayRangeOutput {
                total_lines: day.lines,
                offset,
                text: engine.get_day_range(&day.text, offset, limit),
                warnings: day.warnings,
            };
            serde_json::to_writer_pretty(&mut out, &output)?;
        }
    }
    writeln!(out)?;
    Ok(())
}
