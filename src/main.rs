//! devops-demo: a small HTTP service for exercising orchestration failure modes.
//!
//! This is the application entry point. It initializes tracing, runs the
//! crash-on-start checks, starts the readiness timer and the optional memory
//! ramp, sets up the Axum router, and serves HTTP until a shutdown signal.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use devops_demo::config::{
    EnvSource, LogFormat, ProcessEnv, StartupConfig, DEFAULT_HOST, DEFAULT_LOG_FILTER,
};
use devops_demo::readiness::{self, ReadinessFlag};
use devops_demo::state::BootTime;
use devops_demo::templates::init_templates;
use devops_demo::{create_router, http, memory, startup, AppState};

/// devops-demo: crash, stall, or exhaust memory on demand
#[derive(Parser, Debug)]
#[command(name = "devops-demo", version, about)]
struct Args {
    /// Address to listen on (the port comes from PORT)
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Log level filter (e.g., "devops_demo=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log output format (overrides LOG_FORMAT)
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let boot = BootTime::now();
    let args = Args::parse();
    let env = ProcessEnv;

    init_tracing(&args, &env);

    match run(boot, args, env).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Exiting");
            ExitCode::from(1)
        }
    }
}

/// Initialize tracing with priority: CLI > env > default
fn init_tracing(args: &Args, env: &dyn EnvSource) {
    let log_filter = args
        .log_level
        .clone()
        .or_else(|| env.var("RUST_LOG"))
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    let log_format = args.log_format.unwrap_or_else(|| LogFormat::from_env(env));

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));

    match log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn run(
    boot: BootTime,
    args: Args,
    env: ProcessEnv,
) -> Result<(), Box<dyn std::error::Error>> {
    // Crash-on-start scenarios; nothing is bound yet
    let config = StartupConfig::from_env(&env)?;
    startup::check(&config)?;

    tracing::info!(
        port = config.port,
        startup_delay_secs = config.startup_delay.as_secs(),
        memory_hog_mb = config.memory_hog_mb,
        "Startup checks passed"
    );

    let flag = ReadinessFlag::new();
    readiness::start_timer(&flag, config.startup_delay);

    // Runs on its own thread so the listener still binds
    memory::spawn_ramp(config.memory_hog_mb)?;

    let tera = init_templates()?;
    let state = AppState::from_process(boot, flag, tera);
    let app = create_router(state);

    http::start_server(app, &args.host, config.port).await?;

    Ok(())
}
