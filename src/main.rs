use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use taskdeck::app::App;
use taskdeck::config::Config;
use taskdeck::logging;

#[derive(Parser, Debug)]
#[command(name = "taskdeck")]
#[command(about = "A terminal client for task-management workspaces")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./taskdeck.yaml, then $XDG_CONFIG_HOME/taskdeck/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Workspace snapshot (JSON) to read, overriding the config file
  #[arg(short, long)]
  data: Option<PathBuf>,

  /// Project ID whose tasks open first
  #[arg(short, long)]
  project: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = Config::load(args.config.as_deref())?;
  if let Some(data) = args.data {
    config.snapshot = Some(data);
  }
  if let Some(project) = args.project {
    config.default_project = Some(project);
  }

  // Dropping the guard flushes buffered log lines
  let _log_guard = logging::init(&config)?;

  let mut app = App::new(config)?;
  app.run().await?;

  Ok(())
}
