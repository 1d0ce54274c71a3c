// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

mod backend;
mod cli;
mod commands;
mod completion;
mod config;
mod error;
mod history;
mod model;
mod output;
mod render;
mod roster;
mod session;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use clap::builder::styling::{AnsiColor, Effects, Styles};

use config::Config;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "chatterm")]
#[command(about = "Chat from your terminal")]
#[command(version)]
#[command(styles = STYLES)]
struct Args {
    #[arg(long, help = "Config file (default: <config dir>/chatterm/config.toml)")]
    config: Option<PathBuf>,

    #[arg(long, help = "Serve conversations from a JSON or TOML fixture file")]
    fixture: Option<PathBuf>,

    #[arg(long, help = "Do not download or render images")]
    no_images: bool,

    #[arg(long, help = "Disable colored output, including image rasters")]
    no_color: bool,

    #[arg(long, help = "Messages to fetch when opening a chat")]
    history_limit: Option<usize>,

    #[arg(long, help = "Log file (default: <cache dir>/chatterm/chatterm.log)")]
    log_file: Option<PathBuf>,

    #[arg(long, default_value = "info", help = "Log level when RUST_LOG is unset")]
    log_level: String,
}

/// Send tracing output to `path`. The terminal belongs to the prompt, so
/// nothing is logged to stdout or stderr. Logging stays off when the file
/// cannot be opened.
fn init_logging(path: &Path, level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    if let Some(parent) = path.parent()
        && std::fs::create_dir_all(parent).is_err()
    {
        return;
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}

fn apply_args(config: &mut Config, args: &Args) {
    if args.no_images {
        config.auto_download_image = false;
    }
    if args.no_color {
        config.ascii_color = false;
    }
    if let Some(limit) = args.history_limit {
        config.history_limit = limit;
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let log_file = args
        .log_file
        .clone()
        .unwrap_or_else(|| Config::cache_dir().join("chatterm.log"));
    init_logging(&log_file, &args.log_level);

    if args.no_color {
        colored::control::set_override(false);
    }

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            cli::print_fatal(&format!("Error: {e}"));
            return ExitCode::FAILURE;
        }
    };
    apply_args(&mut config, &args);
    tracing::info!(?config, "Starting");

    let Some(fixture) = args.fixture.as_deref() else {
        cli::print_fatal(
            "Error: no backend configured; pass --fixture <file> to load conversations",
        );
        return ExitCode::FAILURE;
    };

    match cli::run(config, fixture).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Already reported by the front end.
            tracing::debug!(error = %e, "Exiting after error");
            ExitCode::FAILURE
        }
    }
}
