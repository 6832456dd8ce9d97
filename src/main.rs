//! Naggy classroom server — entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Build the LLM provider and open the stores
//!   6. Spawn Ctrl-C → shutdown signal watcher
//!   7. Serve HTTP until shutdown

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use naggy::error::AppError;
use naggy::llm::providers;
use naggy::server::{self, AppState};
use naggy::store::Stores;
use naggy::teaching::Prompts;
use naggy::{config, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    let force_cli_level = args.log_level.is_some();

    logger::init(effective_log_level, force_cli_level)?;

    info!(
        name = %config.name,
        work_dir = %config.work_dir.display(),
        bind = %config.server.bind,
        prompts_dir = %config.server.prompts_dir.display(),
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        "config loaded"
    );

    let llm = providers::build(&config.llm, config.llm_api_key.clone())?;
    if llm.has_credentials() {
        info!(provider = llm.name(), "llm provider ready");
    } else {
        warn!(provider = llm.name(), "no API key set — LLM routes will answer 500");
    }

    let stores = Stores::open(&config)?;
    let prompts = Prompts::new(&config.server.prompts_dir);
    let state = AppState::new(&config.name, llm, prompts, stores);

    // Ctrl-C handler — cancels the token so the server drains and exits.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    server::run(&config.server.bind, state, shutdown).await
}

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: naggy [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                println!();
                println!("Environment:");
                println!("  GEMINI_API_KEY             API key for the LLM provider");
                println!("  GEMINI_MODEL               Model name override");
                println!("  NAGGY_WORK_DIR, NAGGY_BIND, NAGGY_LOG_LEVEL");
                std::process::exit(0);
            }
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            other => eprintln!("warning: ignoring unknown argument '{other}'"),
        }
    }

    CliArgs { log_level: logger::level_for_verbosity(verbosity), config_path }
}
