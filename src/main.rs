// convertifier - Python <-> C++ code converter backed by Gemini with a local fallback

use anyhow::Result;
use clap::Parser;
use convertifier::cli::{self, Args, Command, ServeArgs};
use convertifier::config::AppConfig;
use convertifier::converter::Converter;
use convertifier::server::create_router;
use convertifier::utils::logging;
use std::net::SocketAddr;
use std::process::ExitCode;
use tokio::signal;
use tracing::{error, info};

fn main() -> Result<ExitCode> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let config = cli::load_config(&args)?;

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers.max(1))
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        match args.command {
            None => serve(config, ServeArgs::default()).await,
            Some(Command::Serve(serve_args)) => serve(config, serve_args).await,
            Some(Command::Convert(convert_args)) => cli::convert(convert_args, &config).await,
            Some(Command::Validate(validate_args)) => cli::validate_source(validate_args).await,
            Some(Command::Config) => cli::print_config(&config),
        }
    })
}

async fn serve(mut config: AppConfig, overrides: ServeArgs) -> Result<ExitCode> {
    overrides.apply(&mut config);
    info!("Starting convertifier v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Set up the conversion service
    let converter = Converter::from_config(&config);
    if converter.ai_available() {
        info!("AI-enhanced conversion available");
    } else {
        info!("Only basic conversion available; set {} to enable AI", convertifier::config::API_KEY_ENV);
    }

    // Phase 4: Build and start HTTP server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = create_router(config, converter);

    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 5: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(ExitCode::SUCCESS)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
