use anyhow::Result;
use clap::{Parser, ValueEnum};
use gcloud_core::project::{MetadataProbe, ProjectResolver};
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Print the Google Cloud project this machine would use by default
#[derive(Parser, Debug)]
#[command(name = "gcloud-project", version = gcloud_core::LIBRARY_VERSION, about, long_about = None)]
struct Args {
    /// Also print where the project id was found
    #[arg(long)]
    explain: bool,

    /// Do not query the metadata server
    #[arg(long)]
    no_metadata: bool,

    /// Timeout for the metadata server probe, in milliseconds
    #[arg(long, default_value_t = 1000)]
    metadata_timeout_ms: u64,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// `RUST_LOG` takes precedence over `--log-level`
fn log_filter(level: LogLevel, rust_log: Option<&str>) -> Option<EnvFilter> {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return Some(filter),
            Err(e) => eprintln!("Ignoring invalid RUST_LOG: {}", e),
        }
    }
    let tracing_level = level.to_tracing_level()?;
    Some(EnvFilter::new(tracing_level.as_str().to_lowercase()))
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(level, rust_log.as_deref())?;

    // stdout carries the project id, logs go to stderr
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gcloud-project started with log level: {:?}", level);

    Some(guard)
}

fn metadata_probe(args: &Args) -> MetadataProbe {
    if args.no_metadata {
        return MetadataProbe::disabled();
    }
    MetadataProbe::new().with_timeout(Duration::from_millis(args.metadata_timeout_ms))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let resolver = ProjectResolver::new().with_metadata_probe(metadata_probe(&args));

    let Some(resolved) = resolver.resolve().await else {
        return Err(anyhow::anyhow!(
            "No GCP project configured. Set GCLOUD_PROJECT or run 'gcloud config set project'"
        ));
    };

    if args.explain {
        println!("{} ({})", resolved.project_id, resolved.source);
    } else {
        println!("{}", resolved.project_id);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_off_without_rust_log() {
        assert!(log_filter(LogLevel::Off, None).is_none());
        assert!(log_filter(LogLevel::Off, Some("  ")).is_none());
    }

    #[test]
    fn test_log_filter_from_level() {
        let filter = log_filter(LogLevel::Debug, None).unwrap();
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn test_rust_log_overrides_level() {
        let filter = log_filter(LogLevel::Off, Some("gcloud_core=trace")).unwrap();
        assert_eq!(filter.to_string(), "gcloud_core=trace");
    }

    #[test]
    fn test_invalid_rust_log_falls_back_to_level() {
        let filter = log_filter(LogLevel::Warn, Some("gcloud_core=bogus")).unwrap();
        assert_eq!(filter.to_string(), "warn");
    }
}
