use std::io;
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;
use std::thread;

use tokio::sync::Notify;

use crate::app_types::{BestHandle, EngineCommand};
use crate::engine::{Engine, GenerationReport};
use crate::export::SnapshotWriter;
use crate::fitness::MetricsSnapshot;
use crate::mutate::Mutator;

/// per-run knobs for the background loop
#[derive(Clone, Debug, Default)]
pub struct LoopOptions {
    pub log_interval: u64,
    pub max_generations: Option<u64>,
}

/// background engine thread plus its command channel
pub struct EngineThread {
    command_tx: mpsc::Sender<EngineCommand>,
    handle: thread::JoinHandle<u64>,
    best: BestHandle,
    finished: Arc<Notify>,
}

impl EngineThread {
    /// move the engine onto a dedicated "engine" thread and start generating immediately
    pub fn spawn<M>(
        mut engine: Engine<M>,
        options: LoopOptions,
        mut snapshots: Option<SnapshotWriter>,
    ) -> io::Result<Self>
    where
        M: Mutator + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel();
        let best = engine.best_handle();
        let observed = best.clone();
        let finished = Arc::new(Notify::new());
        let finished_tx = finished.clone();
        let num_pixels = engine.target().num_pixels();

        let handle = thread::Builder::new().name("engine".to_owned()).spawn(move || {
            let ran = engine.run(|report: &GenerationReport| {
                profiling::scope!("engine_thread_loop");
                log_progress(report, &options, num_pixels);

                if let Some(writer) = snapshots.as_mut() {
                    if writer.is_due(report.generation) {
                        // non-fatal: keep evolving even if the disk write fails
                        if let Err(e) = writer.write_if_changed(&observed) {
                            tracing::warn!(path = %writer.path().display(), "snapshot failed: {e}");
                        }
                    }
                }

                if options.max_generations.is_some_and(|max| report.generation >= max) {
                    tracing::info!(generation = report.generation, "generation limit reached");
                    return true;
                }

                // check for commands (non-blocking), once per generation
                match command_rx.try_recv() {
                    Ok(EngineCommand::Stop) | Err(TryRecvError::Disconnected) => true,
                    Err(TryRecvError::Empty) => false,
                }
            });
            tracing::info!(generations = ran, score = engine.best_score(), "engine stopped");
            finished_tx.notify_one();
            ran
        })?;

        Ok(Self { command_tx, handle, best, finished })
    }

    pub fn best_handle(&self) -> BestHandle {
        self.best.clone()
    }

    /// resolves once the loop exits on its own (generation limit) or after a stop
    pub async fn wait_finished(&self) {
        self.finished.notified().await;
    }

    /// ask the loop to stop and join it. returns the number of generations run.
    pub fn stop(self) -> u64 {
        let _ = self.command_tx.send(EngineCommand::Stop);
        match self.handle.join() {
            Ok(ran) => ran,
            Err(_) => {
                tracing::error!("engine thread panicked");
                0
            }
        }
    }
}

fn log_progress(report: &GenerationReport, options: &LoopOptions, num_pixels: usize) {
    if options.log_interval == 0 || report.generation % options.log_interval != 0 {
        return;
    }
    let metrics = MetricsSnapshot::from_sse(report.best_score, num_pixels);
    tracing::info!(
        generation = report.generation,
        score = report.best_score,
        circles = report.best_len,
        psnr = metrics.psnr,
        "progress"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutate::RandomMutator;
    use crate::mutation_config::MutateConfig;
    use crate::pixels::PixelBuffer;

    fn small_engine() -> Engine<RandomMutator> {
        let cfg = MutateConfig { population_size: 4, ..Default::default() };
        let mutator = RandomMutator::seeded(21, cfg.clone());
        Engine::new(PixelBuffer::filled(8, 8, [40, 90, 200]), &cfg, mutator)
    }

    #[test]
    fn test_generation_limit_ends_loop() {
        let options = LoopOptions { log_interval: 2, max_generations: Some(5) };
        let thread = EngineThread::spawn(small_engine(), options, None).unwrap();
        let best = thread.best_handle();
        assert_eq!(thread.stop(), 5);
        assert_eq!(best.snapshot().generation, 5);
    }

    #[test]
    fn test_stop_command_ends_loop() {
        let thread = EngineThread::spawn(small_engine(), LoopOptions::default(), None).unwrap();
        let best = thread.best_handle();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let ran = thread.stop();
        assert!(ran >= 1);
        let snap = best.snapshot();
        assert_eq!(snap.generation, ran);
        assert!(snap.has_result());
    }

    #[test]
    fn test_periodic_snapshot_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.png");
        let writer = SnapshotWriter::new(&path, 3);
        let options = LoopOptions { log_interval: 0, max_generations: Some(9) };
        let thread = EngineThread::spawn(small_engine(), options, Some(writer)).unwrap();
        thread.stop();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_wait_finished_resolves_at_limit() {
        let options = LoopOptions { log_interval: 0, max_generations: Some(3) };
        let thread = EngineThread::spawn(small_engine(), options, None).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(30), thread.wait_finished())
            .await
            .unwrap();
        assert_eq!(thread.stop(), 3);
    }
}
