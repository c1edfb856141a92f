mod cli;
mod session;

use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use casement_config::HostConfig;
use casement_platform::{MemoryClipboard, SystemClipboard};
use casement_webview::{HeadlessFactory, SharedClipboard};
use casement_window::WindowManager;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_DIRECTIVE: &str = "casement=info";

fn init_logging(directive: Option<&str>) {
    let directive = directive.unwrap_or(DEFAULT_LOG_DIRECTIVE);
    let filter = match directive.parse() {
        Ok(parsed) => EnvFilter::from_default_env().add_directive(parsed),
        Err(_) => EnvFilter::from_default_env().add_directive(
            DEFAULT_LOG_DIRECTIVE
                .parse()
                .unwrap_or_else(|_| LevelFilter::INFO.into()),
        ),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&str>) -> HostConfig {
    let loaded = match path {
        Some(path) => {
            tracing::info!("Using config override: {path}");
            casement_config::load_from_path(Path::new(path))
        }
        None => casement_config::load_config(),
    };
    loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        HostConfig::default()
    })
}

fn clipboard(system: bool) -> SharedClipboard {
    if system {
        match SystemClipboard::new() {
            Ok(clipboard) => return Arc::new(Mutex::new(clipboard)),
            Err(e) => tracing::warn!("System clipboard unavailable, using memory: {e}"),
        }
    }
    Arc::new(Mutex::new(MemoryClipboard::new()))
}

fn main() -> ExitCode {
    let args = cli::parse();
    init_logging(args.log_level.as_deref());

    tracing::info!("Casement v{} starting...", env!("CARGO_PKG_VERSION"));
    let config = load_config(args.config.as_deref());

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = runtime.block_on(async {
        let manager = WindowManager::new(config, Arc::new(HeadlessFactory::new()))?;
        manager.set_clipboard(clipboard(args.system_clipboard));
        let summaries = session::run(&manager, args.windows).await;
        manager.destroy_all();
        summaries
    });

    let summaries = match outcome {
        Ok(summaries) => summaries,
        Err(e) => {
            tracing::error!("Session failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&summaries) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                tracing::error!("Failed to serialize window states: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        for summary in &summaries {
            println!("{summary}");
        }
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
