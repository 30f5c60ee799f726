mod app_types;
mod dna;
mod engine;
mod engine_thread;
mod error;
mod export;
mod fitness;
mod mutate;
mod mutation_config;
mod pixels;
mod render;
mod server;
mod settings;

use std::net::SocketAddr;

use anyhow::Context;
use tokio::task::JoinError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::engine::Engine;
use crate::engine_thread::{EngineThread, LoopOptions};
use crate::error::TraceError;
use crate::export::{status_line, SnapshotWriter};
use crate::mutate::RandomMutator;
use crate::pixels::PixelBuffer;
use crate::server::ServerState;
use crate::settings::AppSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "circletrace=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = AppSettings::load().context("failed to resolve settings")?;
    let target_path = settings.target_path.clone().ok_or(TraceError::MissingTarget)?;

    // fatal at startup: nothing runs without a decodable target
    let target = PixelBuffer::load(&target_path)?;
    tracing::info!(
        path = %target_path.display(),
        width = target.width,
        height = target.height,
        population = settings.mutation.population_size,
        "loaded target"
    );

    let mutator = match settings.seed {
        Some(seed) => RandomMutator::seeded(seed, settings.mutation.clone()),
        None => RandomMutator::from_entropy(settings.mutation.clone()),
    };
    let engine = Engine::new(target, &settings.mutation, mutator);

    let snapshots = settings.snapshot_target().map(|(path, interval)| {
        tracing::info!(path = %path.display(), interval, "periodic snapshots enabled");
        SnapshotWriter::new(path, interval)
    });
    let options = LoopOptions {
        log_interval: settings.log_interval,
        max_generations: settings.max_generations,
    };
    let engine_thread =
        EngineThread::spawn(engine, options, snapshots).context("failed to spawn engine thread")?;
    let best = engine_thread.best_handle();

    let stop_signal = async {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("interrupted, stopping"),
            _ = engine_thread.wait_finished() => {}
        }
    };

    if settings.serve_http {
        let host: std::net::IpAddr = settings
            .bind_host
            .parse()
            .map_err(|_| TraceError::InvalidSettings(format!("bad bind_host: {}", settings.bind_host)))?;
        let addr = SocketAddr::new(host, settings.port);
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let mut server = tokio::spawn(server::serve(addr, ServerState { best: best.clone() }, async {
            let _ = shutdown_rx.await;
        }));

        // the server only exits early on a bind/serve failure
        let early_exit = tokio::select! {
            _ = stop_signal => None,
            result = &mut server => Some(result),
        };
        let server_result = match early_exit {
            Some(result) => result,
            None => {
                let _ = shutdown_tx.send(());
                server.await
            }
        };

        engine_thread.stop();
        server_outcome(server_result)?;
    } else {
        stop_signal.await;
        engine_thread.stop();
    }

    println!("{}", status_line(&best.snapshot(), best.elapsed()));
    Ok(())
}

/// both a serve error and a panicked/cancelled server task are fatal
fn server_outcome(joined: Result<Result<(), TraceError>, JoinError>) -> anyhow::Result<()> {
    match joined {
        Ok(result) => result.context("status server failed"),
        Err(e) => Err(e).context("status server task failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_task_panic_is_an_error() {
        let joined = tokio::spawn(async {
            if true {
                panic!("boom");
            }
            Ok::<(), TraceError>(())
        })
        .await;
        let err = server_outcome(joined).unwrap_err();
        assert!(err.to_string().contains("status server task failed"));
    }

    #[tokio::test]
    async fn test_server_error_and_clean_exit() {
        let joined = tokio::spawn(async { Err::<(), _>(TraceError::MissingTarget) }).await;
        let err = server_outcome(joined).unwrap_err();
        assert!(err.to_string().contains("status server failed"));

        let joined = tokio::spawn(async { Ok::<(), TraceError>(()) }).await;
        assert!(server_outcome(joined).is_ok());
    }
}
