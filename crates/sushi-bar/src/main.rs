use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use sushi_bar::{AdmissionController, SushiBarService, config::Opts, serve};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opts = Opts::parse();

    let controller = Arc::new(AdmissionController::new(opts.capacity));
    let service = SushiBarService::new(controller).with_enter_timeout(opts.enter_timeout());

    let addr = opts.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!(capacity = opts.capacity.get(), "sushi bar listening on {}", addr);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl_c: {}", e);
        }
        info!("sushi bar closing");
    };

    if let Err(e) = serve(listener, service, shutdown).await {
        error!("server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
