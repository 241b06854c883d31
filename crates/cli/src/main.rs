mod check_commands;
mod classify_commands;
mod setup;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    sweeney_config::FeatureFlags,
    tracing::{info, warn},
    tracing_subscriber::{
        EnvFilter, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
    },
};

/// Targets that stay at `warn` unless gateway logging is switched on.
const GATEWAY_LOG_TARGETS: &[&str] = &["serenity", "tracing::span"];

#[derive(Parser)]
#[command(name = "sweeney", version, about = "Sweeney, a Discord reaction bot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (overrides discovery of ./sweeney.toml and the user config dir).
    #[arg(long, global = true, env = "SWEENEY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and react to messages (default when no subcommand is provided).
    Run,
    /// Classify a message offline and print the reactions it would get.
    Classify {
        /// Message text.
        #[arg(short, long, default_value = "")]
        text: String,
        /// Local image treated as an attachment. Repeatable, order is kept.
        #[arg(short, long = "image")]
        images: Vec<PathBuf>,
        /// Print the full classification as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Report feature flags, OCR availability and the trigger catalog.
    Check,
}

fn build_filter(log_level: &str, gateway_log: bool) -> EnvFilter {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    if !gateway_log {
        for target in GATEWAY_LOG_TARGETS {
            if let Ok(directive) = format!("{target}=warn").parse() {
                filter = filter.add_directive(directive);
            }
        }
    }
    filter
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Install the global subscriber with gateway targets capped.
///
/// Config is loaded after this so its warnings are not lost; the returned
/// handle lifts the cap once the feature flags are known.
fn init_telemetry(cli: &Cli) -> FilterHandle {
    let (filter, handle) = reload::Layer::new(build_filter(&cli.log_level, false));
    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
    handle
}

fn apply_flags(
    handle: &FilterHandle,
    log_level: &str,
    flags: FeatureFlags,
) -> Result<(), reload::Error> {
    if flags.gateway_log {
        handle.reload(build_filter(log_level, true))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = init_telemetry(&cli);

    let config = setup::load_config(cli.config.as_deref())?;
    let flags = FeatureFlags::resolve(&config.features);
    if let Err(e) = apply_flags(&filter, &cli.log_level, flags) {
        warn!(error = %e, "failed to enable gateway logging");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        ocr = flags.ocr,
        image_matching = flags.image_matching,
        gateway_log = flags.gateway_log,
        "sweeney starting"
    );

    match cli.command {
        None | Some(Commands::Run) => setup::run(&config, flags).await,
        Some(Commands::Classify { text, images, json }) => {
            classify_commands::handle_classify(&config, flags, text, &images, json).await
        },
        Some(Commands::Check) => check_commands::handle_check(&config, flags).await,
    }
}
