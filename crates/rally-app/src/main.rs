//! Rally binary: API server, simulated match feed and a console voice session.

mod cli;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;

use rally_api::AppState;
use rally_core::config::API_KEY_ENV;
use rally_core::{RallyConfig, RallyError, SharedStatStore};
use rally_sim::MatchSimulator;
use rally_voice::{ConsoleSynthesizer, LineRecognizer, ProxyClient, VoiceQueryDispatcher, VoiceSession};

use cli::CliArgs;

/// A future that resolves once shutdown has been requested.
fn shutdown_signal(mut rx: watch::Receiver<bool>) -> impl Future<Output = ()> + Send + 'static {
    async move {
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

/// Settle the loaded configuration, logging why defaults are used.
fn config_or_default(path: &Path, loaded: rally_core::Result<RallyConfig>) -> RallyConfig {
    match loaded {
        Ok(config) => {
            tracing::info!(path = %path.display(), "Configuration loaded");
            config
        }
        Err(RallyError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "No configuration file, using defaults");
            RallyConfig::default()
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to load configuration, using defaults"
            );
            RallyConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config file is read before tracing so its log level can apply; the
    // outcome is reported once the subscriber is installed.
    let config_file = args.resolve_config_path();
    let loaded = RallyConfig::load(&config_file);

    // Tracing.
    let log_level =
        args.resolve_log_level(loaded.as_ref().ok().map(|c| c.general.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting Rally v{}", env!("CARGO_PKG_VERSION"));

    let mut config = config_or_default(&config_file, loaded);
    config.apply_env_overrides();
    config.general.port = args.resolve_port(config.general.port);

    if config.model.api_key.is_none() {
        tracing::warn!(
            "{} no está definida. El agente de voz no funcionará.",
            API_KEY_ENV
        );
    }

    let stats = SharedStatStore::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let port = config.general.port;

    // === API server ===

    let state = AppState::from_config(config.clone(), stats.clone());
    let mut server = tokio::spawn(rally_api::start_server(
        port,
        state,
        shutdown_signal(shutdown_rx.clone()),
    ));

    // === Simulated match feed ===

    let simulation = if args.simulation_enabled(config.simulation.enabled) {
        let simulator = MatchSimulator::new(config.simulation.clone(), stats.clone());
        let shutdown = shutdown_signal(shutdown_rx.clone());
        Some(tokio::spawn(async move { simulator.run(shutdown).await }))
    } else {
        tracing::info!("Match simulation disabled");
        None
    };

    // === Voice session ===

    if args.no_voice {
        tracing::info!("Voice session disabled");
    } else {
        let proxy_url = config.proxy_url();
        tracing::info!(proxy = %proxy_url, locale = %config.voice.locale, "Voice session ready, type a query per line");

        let dispatcher = Arc::new(VoiceQueryDispatcher::new(
            &config.voice,
            stats.clone(),
            Arc::new(ProxyClient::new(proxy_url)),
            Arc::new(ConsoleSynthesizer::default()),
        ));
        let session = VoiceSession::new(LineRecognizer::stdin(), dispatcher);
        let shutdown = shutdown_signal(shutdown_rx.clone());
        // Stdin reads cannot be cancelled; the runtime exits after the next line.
        tokio::spawn(async move {
            match session.run_until(shutdown).await {
                Ok(received) => tracing::info!(received, "Voice session ended"),
                Err(e) => tracing::error!(error = %e, "Voice session failed"),
            }
        });
    }

    // === Wait for shutdown ===

    let server_result = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Shutting down");
            let _ = shutdown_tx.send(true);
            server.await
        }
        result = &mut server => {
            let _ = shutdown_tx.send(true);
            result
        }
    };

    if let Some(simulation) = simulation {
        match simulation.await {
            Ok(board) => tracing::info!(
                sets = ?board.sets(),
                winner = ?board.winner(),
                "Final score"
            ),
            Err(e) => tracing::warn!(error = %e, "Simulation task failed"),
        }
    }

    let summary = stats.lock().summary(rally_core::now_millis());
    tracing::info!(
        points = summary.points,
        serves = summary.serves,
        max_serve_kmh = ?summary.max_serve_kmh,
        "Session stats"
    );

    match server_result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "API server failed");
            tracing::error!("Try: RALLY_PORT={} rally", port.saturating_add(1));
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
