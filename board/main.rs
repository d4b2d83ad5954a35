/// ferrite-metrics board
///
/// A small scalar viewer for the event files written during training,
/// in the spirit of `tensorboard --logdir`. Served by a synchronous tiny_http
/// server; the page draws its charts with inline SVG.
///
/// Run with:
///   cargo run --bin board --release -- --logdir logs
/// Then open http://127.0.0.1:6006

mod handlers;
mod render;
mod routes;
mod state;
mod util;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tiny_http::Server;
use tracing_subscriber::EnvFilter;

use state::BoardState;

#[derive(Parser)]
#[command(name = "board", version, about = "Browse scalar event files in a log directory")]
struct Cli {
    /// Log directory to scan for runs.
    #[arg(long, default_value = "logs")]
    logdir: PathBuf,
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:6006")]
    addr: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let server = Server::http(&cli.addr)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("binding HTTP server on {}", cli.addr))?;

    let state = Arc::new(BoardState::new(cli.logdir));

    tracing::info!(addr = %cli.addr, logdir = %state.log_dir.display(), "board listening");
    println!("Open http://{} in your browser", cli.addr);

    // One thread per request; event files are re-read on every API call so
    // a run that is still training shows up without restarting the board.
    for request in server.incoming_requests() {
        let state = state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state);
        });
    }
    Ok(())
}
