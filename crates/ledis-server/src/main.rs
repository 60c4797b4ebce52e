use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;

use ledis_server::gate::Gate;
use ledis_server::server;

/// A lightweight Redis-like engine serving one textual command per line.
#[derive(Debug, Parser)]
#[command(name = "ledis-server", version)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:6380")]
    listen: String,

    /// Read commands from stdin instead of serving TCP.
    #[arg(long)]
    repl: bool,

    /// Directory holding the snapshot file (defaults to the current
    /// working directory; the filename is always `ledis.snpsht`).
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledis=info".into()),
        )
        .init();

    let args = Args::parse();
    let gate = match args.data_dir {
        Some(dir) => Gate::with_data_dir(dir),
        None => Gate::new(),
    };

    let result = if args.repl {
        server::repl(&gate)
    } else {
        server::serve(Arc::new(gate), &args.listen)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}
