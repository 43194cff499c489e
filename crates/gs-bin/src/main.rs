//! gridspeak entrypoint.
use anyhow::Result;
use clap::Parser;
use core_config::{Config, load_from};
use core_events::{EVENT_CHANNEL_CAP, Event, EventSourceRegistry, HealthCheckSource};
use core_generation::GenerationOptions;
use core_input::KeyBindings;
use core_render::{CrosstermBackend, TerminalBackend, TerminalGuard};
use core_wire::{HttpPredictionClient, PredictionService};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Once};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod commands;
mod runtime;
#[cfg(test)]
mod test_support;

use commands::{BackendCommand, run_command};
use runtime::{GridRuntime, RuntimeTasks, Session};

const LOG_FILE: &str = "gridspeak.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "gridspeak", version, about = "Switch-scanning word grid with AI prediction")]
struct Args {
    /// Configuration file path (overrides discovery of `gridspeak.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
    /// Prediction backend base URL (overrides env and config file).
    #[arg(long = "backend-url")]
    backend_url: Option<String>,
    #[command(subcommand)]
    command: Option<BackendCommand>,
}

struct AppStartup {
    backend: CrosstermBackend,
    log_guard: Option<WorkerGuard>,
}

/// Resolved settings shared by the interactive UI and the one-shot commands.
struct Bootstrap {
    config: Config,
    base_url: String,
    service: Arc<HttpPredictionClient>,
}

impl AppStartup {
    fn new() -> Self {
        Self {
            backend: CrosstermBackend::new(),
            log_guard: None,
        }
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join(LOG_FILE);
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }

    fn bootstrap(args: &Args) -> Result<Bootstrap> {
        let config = load_from(args.config.clone())?;
        let base_url = config.base_url_with_env(args.backend_url.as_deref());
        let service = HttpPredictionClient::with_timeout(
            base_url.as_str(),
            config.file.backend.request_timeout(),
        )?;
        info!(
            target: "runtime.startup",
            base_url = base_url.as_str(),
            config_source = ?config.source,
            config_override = args.config.is_some(),
            health_interval_secs = config.file.backend.health_interval().as_secs(),
            "bootstrap_complete"
        );
        Ok(Bootstrap {
            config,
            base_url,
            service: Arc::new(service),
        })
    }

    fn enter_terminal(&mut self) -> Result<TerminalGuard<'_>> {
        self.backend.set_title("gridspeak")?;
        self.backend.enter_guard()
    }
}

/// Bindings from config, or the built-in set when the configured keys do not parse.
fn key_bindings(config: &Config) -> Result<KeyBindings> {
    match KeyBindings::from_config(&config.file.keys) {
        Ok(bindings) => Ok(bindings),
        Err(err) => {
            warn!(target: "input.keys", %err, "key_bindings_invalid_using_defaults");
            Ok(KeyBindings::from_config(&Default::default())?)
        }
    }
}

fn generation_options(config: &Config) -> GenerationOptions {
    GenerationOptions {
        suppress_stale_responses: config.file.generation.suppress_stale_responses,
        warm_cache: config.file.generation.warm_cache,
    }
}

async fn run_interactive(startup: &mut AppStartup, boot: Bootstrap) -> Result<()> {
    let bindings = key_bindings(&boot.config)?;
    let service: Arc<dyn PredictionService> = boot.service;
    let session = Session::new(service, generation_options(&boot.config), bindings);
    let health_interval = boot.config.file.backend.health_interval();

    let guard = startup.enter_terminal()?;
    let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let (input_task, input_shutdown) = core_input::spawn_async_input(tx.clone());
    let mut registry = EventSourceRegistry::new();
    registry.register(HealthCheckSource::new(health_interval));
    let source_handles = registry.spawn_all(&tx);

    let tasks = RuntimeTasks {
        input_task: Some(input_task),
        input_shutdown: Some(input_shutdown),
        source_handles,
    };
    let mut runtime = GridRuntime::new(
        session,
        tx,
        rx,
        tasks,
        Some(guard),
        Box::new(std::io::stdout()),
    );
    runtime.run().await
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let mut startup = AppStartup::new();
    startup.configure_logging()?;
    AppStartup::install_panic_hook();
    info!(target: "runtime", "startup");

    let boot = AppStartup::bootstrap(&args)?;
    match args.command.as_ref() {
        Some(cmd) => {
            let base_url = boot.base_url.clone();
            let mut stdout = std::io::stdout();
            if let Err(err) = run_command(cmd, boot.service.as_ref(), &base_url, &mut stdout).await
            {
                error!(target: "runtime.command", command = cmd.as_str(), %err, "command_failed");
                eprintln!("gridspeak {}: {err:#}", cmd.as_str());
                return Ok(ExitCode::FAILURE);
            }
        }
        None => run_interactive(&mut startup, boot).await?,
    }
    Ok(ExitCode::SUCCESS)
}
