use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;

use deskview::app::App;
use deskview::config::Config;

#[derive(Parser, Debug)]
#[command(name = "deskview")]
#[command(about = "A terminal admin console for a hosted helpdesk backend")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/deskview/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Disable the on-disk request cache
  #[arg(long)]
  no_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Log to a file; the terminal belongs to the UI
  let _guard = init_tracing()?;

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  // Initialize and run the app
  let mut app = App::new(config, args.no_cache)?;
  app.run().await?;

  Ok(())
}

fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  use tracing_subscriber::EnvFilter;

  let log_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("deskview")
    .join("logs");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory: {}", e))?;

  let appender = tracing_appender::rolling::daily(log_dir, "deskview.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}
