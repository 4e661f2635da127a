mod cache;
mod config;
mod crm;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cache::{CompanyCache, RefreshHandle};
use crm::CrmClient;

#[derive(Parser, Debug)]
#[command(name = "crmcache")]
#[command(about = "In-memory company cache for a CRM API, with exact-name lookup")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/crmcache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Company names to look up after the cache is filled
  names: Vec<String>,

  /// Print every cached company name
  #[arg(short, long)]
  list: bool,

  /// Keep running with periodic refresh until Ctrl-C
  #[arg(short, long)]
  watch: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let (stderr, _guard) = tracing_appender::non_blocking(std::io::stderr());
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crmcache=info")))
    .with_writer(stderr)
    .init();

  let args = Args::parse();

  let config = config::Config::load(args.config.as_deref())?;
  let client = CrmClient::new(&config)?;
  let cache = Arc::new(CompanyCache::new(client));

  cache.fill().await?;
  info!(
    companies = cache.len(),
    watermark = cache.last_update(),
    "cache ready"
  );
  if cache.is_empty() {
    warn!("the CRM returned no companies");
  }

  for name in &args.names {
    match cache.lookup(name) {
      Some(company) => println!("{}", serde_json::to_string_pretty(&company)?),
      None => println!("{}: nothing found", name),
    }
  }

  if args.list {
    let mut names: Vec<String> = cache
      .snapshot()
      .iter()
      .filter_map(|c| c.name().map(String::from))
      .collect();
    names.sort();
    for name in names {
      println!("{name}");
    }
  }

  if args.watch {
    let period = Duration::from_secs(config.refresh_interval_minutes * 60);
    let refresh = RefreshHandle::spawn(Arc::clone(&cache), period);

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    refresh.stop().await;
  }

  Ok(())
}
