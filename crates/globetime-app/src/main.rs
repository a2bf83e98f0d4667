use std::backtrace::Backtrace;
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use flexi_logger::{
    Age, Cleanup, Criterion, Duplicate, FileSpec, LogSpecBuilder, LogSpecification, Logger,
    LoggerHandle, Naming,
};
use globetime_core::{
    Dashboard, ModuleContext,
    config::{Config, get_config},
    event_bus::{EventBus, EventReceiver},
    services::OpenWeatherClient,
};
use log::{debug, error, info, warn};
use masterror::{AppError, AppResult};
use tokio::{runtime::Handle, signal, time::interval};

/// How often the host drains the event bus.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

const EVENT_QUEUE_CAPACITY: usize = 64;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Parser, Debug)]
#[command(version, about = "Local time and weather around the world", long_about = None)]
struct Args {
    #[arg(short, long, value_parser = clap::value_parser!(PathBuf))]
    config_path: Option<PathBuf>,

    /// Print a single frame once the weather has loaded, then exit
    #[arg(long)]
    once: bool,
}

fn get_log_spec(log_level: &str) -> LogSpecification {
    LogSpecification::env_or_parse(log_level).unwrap_or_else(|err| {
        warn!("Invalid log level '{log_level}' ({err}), falling back to warn");
        LogSpecBuilder::new()
            .default(log::LevelFilter::Warn)
            .build()
    })
}

fn start_logger() -> AppResult<LoggerHandle> {
    let logger = Logger::with(
        LogSpecBuilder::new()
            .default(log::LevelFilter::Info)
            .build(),
    )
    .log_to_file(FileSpec::default().directory("/tmp/globetime"))
    .rotate(
        Criterion::Age(Age::Day),
        Naming::Timestamps,
        Cleanup::KeepLogFiles(7),
    );
    let logger = if cfg!(debug_assertions) {
        logger.duplicate_to_stderr(Duplicate::All)
    } else {
        logger.duplicate_to_stderr(Duplicate::Error)
    };

    logger
        .start()
        .map_err(|e| AppError::internal(format!("Failed to start logger: {e}")))
}

fn weather_client(config: &Config) -> AppResult<Option<Arc<OpenWeatherClient>>> {
    let Some(api_key) = config.weather.resolve_api_key() else {
        warn!(
            "No weather API key: set weather.api_key or {}",
            config.weather.api_key_env
        );
        return Ok(None);
    };

    Ok(Some(Arc::new(OpenWeatherClient::from_config(
        &config.weather,
        api_key,
    )?)))
}

/// Apply everything queued on the bus. Returns `true` if a redraw is due.
fn drain(dashboard: &mut Dashboard<OpenWeatherClient>, receiver: &mut EventReceiver) -> bool {
    let mut dirty = false;

    loop {
        match receiver.try_recv() {
            Ok(Some(event)) => dirty |= dashboard.handle(event),
            Ok(None) => break,
            Err(err) => {
                error!("failed to read event bus payload: {err}");
                break;
            }
        }
    }

    dirty
}

fn draw(frame: &str, clear: bool) -> io::Result<()> {
    let mut stdout = io::stdout().lock();

    if clear {
        stdout.write_all(CLEAR_SCREEN.as_bytes())?;
    }
    stdout.write_all(frame.as_bytes())?;
    stdout.flush()
}

async fn run(args: Args, logger: &LoggerHandle) -> AppResult<()> {
    let (config, config_path) = get_config(args.config_path)?;
    info!("using config {config_path:?}");

    logger.set_new_spec(get_log_spec(&config.log_level));

    let mut dashboard = Dashboard::from_config(&config, weather_client(&config)?)
        .map_err(|e| AppError::internal(e.to_string()))?;

    let capacity = NonZeroUsize::new(EVENT_QUEUE_CAPACITY)
        .ok_or_else(|| AppError::internal("event queue capacity must be non-zero"))?;
    let bus = EventBus::new(capacity);
    let mut receiver = bus.receiver();
    let ctx = ModuleContext::new(bus.sender(), Handle::current());

    dashboard.mount(&ctx)?;

    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut frames = interval(FRAME_INTERVAL);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(err) = result {
                    error!("failed to listen for shutdown signal: {err}");
                }
                info!("shutdown requested");
                break;
            }
            _ = frames.tick() => {
                let dirty = drain(&mut dashboard, &mut receiver);

                if args.once {
                    if dashboard.weather_loaded() {
                        draw(&dashboard.render(), false)
                            .map_err(|e| AppError::internal(format!("Failed to write frame: {e}")))?;
                        break;
                    }
                } else if dirty {
                    draw(&dashboard.render(), true)
                        .map_err(|e| AppError::internal(format!("Failed to write frame: {e}")))?;
                }
            }
        }
    }

    dashboard.unmount();
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let logger = match start_logger() {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    debug!("args: {args:?}");

    panic::set_hook(Box::new(|info| {
        let b = Backtrace::capture();
        error!("Panic: {info} \n {b}");
    }));

    match run(args, &logger).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_config_path_and_once() {
        let args = Args::try_parse_from(["globetime", "-c", "/etc/globetime.toml", "--once"])
            .expect("valid args");

        assert_eq!(args.config_path, Some(PathBuf::from("/etc/globetime.toml")));
        assert!(args.once);
    }

    #[test]
    fn defaults_to_live_mode() {
        let args = Args::try_parse_from(["globetime"]).expect("valid args");

        assert_eq!(args.config_path, None);
        assert!(!args.once);
    }
}
