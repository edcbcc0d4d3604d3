use clap::Parser;
use labflow::app::{handle_fatal_error, init_logging, AppConfig};
use labflow::cli::{execute_command, services::load_config, Cli, Services};
use tracing::{debug, trace};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => handle_fatal_error(e.into(), cli.verbose),
    };

    let app = AppConfig::new(cli.verbose)
        .unwrap_or_default()
        .with_configured_level(config.log_level.clone());
    init_logging(&app);

    debug!("labflow started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    let services = Services::production(config);
    if let Err(e) = execute_command(cli.command, &services).await {
        handle_fatal_error(e, cli.verbose);
    }
}
