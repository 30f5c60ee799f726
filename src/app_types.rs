use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::dna::CircleSet;

/// best-so-far result. circles, score and generation are only ever read/written together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BestState {
    pub width: u32,
    pub height: u32,
    pub circles: CircleSet,
    pub score: u64,           // u64::MAX until the first generation completes
    pub generation: u64,      // generations completed so far
    pub improved_at: u64,     // generation that produced the current circles
}

impl BestState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            circles: CircleSet::new(),
            score: u64::MAX,
            generation: 0,
            improved_at: 0,
        }
    }

    /// true once some generation has produced a scored result
    pub fn has_result(&self) -> bool {
        self.score != u64::MAX
    }
}

/// shared handle to the best state: one lock for the whole struct, so observers never see
/// circles paired with a score from another generation
#[derive(Clone, Debug)]
pub struct BestHandle {
    inner: Arc<Mutex<BestState>>,
    started: Instant,
}

impl BestHandle {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BestState::new(width, height))),
            started: Instant::now(),
        }
    }

    /// consistent copy of the whole state, lock held only for the clone
    pub fn snapshot(&self) -> BestState {
        self.inner.lock().clone()
    }

    /// the single write path, runs `f` under the lock
    pub(crate) fn update<F: FnOnce(&mut BestState)>(&self, f: F) {
        let mut state = self.inner.lock();
        f(&mut state);
    }

    /// wall-clock time since the engine state was created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

// messages to the engine thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    Stop,
}
