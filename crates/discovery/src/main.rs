use anyhow::Result;
use clap::Parser;
use elchi_discovery::app::signals;
use elchi_discovery::app::ApplicationBuilder;
use elchi_discovery::config::Cli;
use elchi_discovery::config::Config;
use tokio_util::sync::CancellationToken;
use utils::version;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();
    let config =
        Config::load(cli).map_err(|e| anyhow::anyhow!("Failed to load config: {e:?}"))?;

    let _guard = utils::logging::init(&config.log)?;

    tracing::info!("Starting elchi-discovery {}", &**version::VERSION);
    tracing::info!(
        token_configured = !config.delivery.token.is_empty(),
        api_endpoint = %config.delivery.endpoint,
        discovery_interval = ?config.discovery_interval,
        insecure_tls = config.delivery.insecure_skip_verify,
        config_file = ?config.config_file,
        "Configuration loaded"
    );

    if let Err(e) = config.validate() {
        tracing::error!("{e}");
        return Err(anyhow::anyhow!("{e:?}"));
    }

    let once = config.once;
    let app = ApplicationBuilder::new(config).build().await?;

    if once {
        let outcome = app.run_cycle().await;
        if !outcome.is_success() {
            return Err(anyhow::anyhow!("Discovery cycle failed: {outcome:?}"));
        }
        return Ok(());
    }

    let cancellation_token = CancellationToken::new();
    let signal_task = signals::cancel_on_shutdown_signal(cancellation_token.clone())?;

    app.run(cancellation_token.clone()).await;

    cancellation_token.cancel();
    signal_task.await?;
    tracing::info!("elchi-discovery stopped");
    Ok(())
}
