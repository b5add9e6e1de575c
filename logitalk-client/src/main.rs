use anyhow::Result;
use clap::Parser;
use logitalk_client::ConnectOptions;
use std::{fs::OpenOptions, path::PathBuf, sync::Mutex, time::Duration};
use tracing_subscriber::EnvFilter;

mod app;
mod components;
mod tui;

// This prevents the console from being messed up if we panic for some reason.
fn initialize_panic_handler() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = crossterm::execute!(std::io::stderr(), crossterm::terminal::LeaveAlternateScreen);
        let _ = crossterm::terminal::disable_raw_mode();
        original_hook(panic_info);
    }));
}

// The UI owns the terminal, so logs only go to a file when one is requested
fn initialize_logging(args: &Args) -> Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let default_directive = if args.debug {
        "logitalk_client=debug,logitalk_protocol=debug,info"
    } else {
        "logitalk_client=info,logitalk_protocol=info,warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Name of the user
    #[arg(short, long, default_value = "Anonymous")]
    name: String,

    /// Remote server to connect to
    #[arg(short, long, default_value = "localhost:8080")]
    addr: String,

    /// Give up connecting after this many seconds
    #[arg(long, value_name = "SECS")]
    connect_timeout: Option<u64>,

    /// Append logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    initialize_logging(&args)?;
    initialize_panic_handler();

    let options = ConnectOptions {
        connect_timeout: args.connect_timeout.map(Duration::from_secs),
    };
    app::run(args.addr, args.name, options).await?;
    Ok(())
}
