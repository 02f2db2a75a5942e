mod app;
mod config;
mod input;
mod library;
mod lyrics;
mod player;
mod playlist;
mod session;
mod storage;
mod tui;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "verse", version, about = "Terminal mini player with synchronized lyrics")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Audio files or directories to queue and play.
    paths: Vec<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a file's embedded lyrics as parsed (headless).
    Lyrics { path: PathBuf },
    /// List playable files in a directory (headless).
    Scan { dir: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;
    let cfg_path = match cli.config.clone() {
        Some(p) => p,
        None => config::default_config_path().context("default config path")?,
    };

    match cli.command {
        Some(Command::Lyrics { path }) => {
            init_stderr_logging();
            let track = library::extract(&path);
            let lyrics =
                lyrics::LyricsTrack::parse(track.embedded_lyrics.as_deref().unwrap_or(""));
            if lyrics.lines.is_empty() {
                println!("(no embedded lyrics)");
            } else {
                for line in &lyrics.lines {
                    if lyrics.synced {
                        println!("[{:>7.2}] {}", line.time_secs, line.text);
                    } else {
                        println!("{}", line.text);
                    }
                }
            }
        }
        Some(Command::Scan { dir }) => {
            init_stderr_logging();
            for path in library::list_audio_files(&dir) {
                println!("{}", path.display());
            }
        }
        None => run_player(cfg, cfg_path, cli.paths).await?,
    }

    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();
}

async fn run_player(
    cfg: config::Config,
    cfg_path: PathBuf,
    paths: Vec<PathBuf>,
) -> anyhow::Result<()> {
    // Raw mode owns the terminal, so logs go to a file in the data dir.
    std::fs::create_dir_all(&cfg.paths.data_dir)
        .with_context(|| format!("create dir {}", cfg.paths.data_dir.display()))?;
    let log_file =
        std::fs::File::create(cfg.paths.data_dir.join("verse.log")).context("open log file")?;
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_ansi(false)
        .with_writer(std::sync::Arc::new(log_file))
        .init();

    // Expand directories so the controller only ever sees files.
    let mut initial = Vec::new();
    for path in paths {
        if path.is_dir() {
            initial.extend(library::list_audio_files(&path));
        } else {
            initial.push(path);
        }
    }

    let storage = storage::StorageHandle::new(cfg.paths.data_dir.join("verse.sqlite3"));
    let (tx, rx) = tokio::sync::mpsc::channel(256);
    let player = player::PlayerHandle::spawn(tx.clone());

    let mut terminal = tui::TerminalGuard::enter().context("init terminal")?;
    let mut app = app::App::new(cfg, cfg_path, storage, player);
    app.run(terminal.terminal_mut(), tx, rx, initial).await
}
