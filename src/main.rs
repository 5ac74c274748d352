use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use fetchkit::{
  AppStore, Config, ConnectivityMonitor, Executor, HttpClient, Notice, Outcome,
  RequestDescriptor, Source,
};

#[derive(Parser, Debug)]
#[command(name = "fetchkit")]
#[command(about = "Offline-aware fetch: probe connectivity, consult the cache, then the network")]
#[command(version)]
struct Args {
  /// URL to fetch
  url: String,

  /// Path to config file (default: $XDG_CONFIG_HOME/fetchkit/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Use an in-memory cache instead of the persisted store
  #[arg(long)]
  no_persist: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_tracing()?;

  let config = Config::load(args.config.as_deref())?;
  url::Url::parse(&args.url).map_err(|e| eyre!("Invalid URL {}: {}", args.url, e))?;

  let store = if args.no_persist {
    AppStore::in_memory()
  } else {
    AppStore::open()?
  };

  let (notifier, mut notices) = fetchkit::notice_channel();
  let monitor = ConnectivityMonitor::new(store.clone(), notifier, config.probe.url.clone())
    .with_interval(config.probe_interval());
  monitor.check().await;
  if let Some(Notice::ConnectionError) = notices.try_next() {
    eprintln!("warning: network unreachable, serving from cache only");
  }

  let mut client = HttpClient::new();
  if let Some(token) = Config::api_token() {
    client = client.with_bearer_token(token);
  }

  let executor = Executor::new(store, client).with_ttl(config.cache_ttl());
  let descriptor = RequestDescriptor::get(&args.url).with_retry(config.retry_options());

  match executor.retry(&descriptor).await {
    Ok(Outcome::Fetched { value, source }) => {
      let origin = match source {
        Source::Network => "network",
        Source::Cache => "cache",
      };
      eprintln!("fetched from {}", origin);
      println!("{}", serde_json::to_string_pretty(&value)?);
      Ok(())
    }
    Ok(Outcome::Offline) => {
      eprintln!("offline and nothing cached for {}", args.url);
      Ok(())
    }
    Err(e) => Err(eyre!("{}", e)),
  }
}

/// Log to a file under the platform data directory so output does not mix
/// with fetched payloads on stdout.
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("fetchkit");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory: {}", e))?;

  let appender = tracing_appender::rolling::never(log_dir, "fetchkit.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}
