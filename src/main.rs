//! support-desk binary entry point.

use std::sync::Arc;

use support_desk::api::{serve_with_state, AppState};
use support_desk::cli::{parse_args, print_help, print_version};
use support_desk::{logging, BroadcastTransport, Config, ReplyCatalog, SessionService};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Try 'support-desk --help' for more information.");
            std::process::exit(1);
        }
    };

    if args.help {
        print_help();
        return;
    }

    if args.version {
        print_version();
        return;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init_with_filter(config.log_filter()) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    let server_config = match config.to_server_config() {
        Ok(server_config) => server_config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!("support-desk v{}", env!("CARGO_PKG_VERSION"));

    let store = config.build_store();
    info!(location = %store.location(), "session store opened");

    let transport = BroadcastTransport::default();
    let service = SessionService::new(store, Arc::new(transport.clone()))
        .with_sweeper(config.sweeper())
        .with_catalog(ReplyCatalog::new(config.support.clone()));
    let service = Arc::new(service);

    if config.sessions.reset_on_start {
        if let Err(e) = service.reset().await {
            error!("Failed to reset sessions: {}", e);
            std::process::exit(1);
        }
    }

    let sweeper = service.sweeper().spawn(Arc::clone(&service));

    let state = AppState::with_service(service, transport);
    let result = serve_with_state(server_config, state).await;

    sweeper.abort();

    if let Err(e) = result {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("support-desk stopped");
}
