use crate::app_types::BestHandle;
use crate::dna::CircleSet;
use crate::fitness::distance;
use crate::mutate::Mutator;
use crate::mutation_config::MutateConfig;
use crate::pixels::PixelBuffer;
use crate::render::CpuRenderer;

/// outcome of one generation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationReport {
    pub generation: u64,      // generations completed, including this one
    pub generation_best: u64, // lowest score seen in this generation
    pub best_score: u64,      // best score ever after this generation
    pub best_len: usize,      // circle count of the best set
    pub improved: bool,
}

/// Hill-climbing optimizer: every generation mutates each member, scores it against the
/// target, keeps the best if it beats the incumbent, then resets the whole population
/// to copies of the incumbent.
pub struct Engine<M: Mutator> {
    mutator: M,
    target: PixelBuffer,             // immutable after load
    population: Vec<CircleSet>,      // owned by the engine thread only
    best_circles: CircleSet,         // engine-side copy, avoids taking the lock to read
    best_score: u64,
    pub generation: u64,
    best: BestHandle,                // published state for observers
}

impl<M: Mutator> Engine<M> {
    pub fn new(target: PixelBuffer, cfg: &MutateConfig, mutator: M) -> Self {
        profiling::scope!("Engine::new");
        let best = BestHandle::new(target.width, target.height);
        Self {
            mutator,
            population: vec![CircleSet::new(); cfg.population_size.max(1)],
            best_circles: CircleSet::new(),
            best_score: u64::MAX,
            generation: 0,
            best,
            target,
        }
    }

    /// handle for observers (status page, snapshot writer)
    pub fn best_handle(&self) -> BestHandle {
        self.best.clone()
    }

    pub fn best_score(&self) -> u64 {
        self.best_score
    }

    #[cfg(test)]
    pub fn best_circles(&self) -> &CircleSet {
        &self.best_circles
    }

    pub fn target(&self) -> &PixelBuffer {
        &self.target
    }

    /// run one generation: mutate → render → score → select → replicate
    pub fn step(&mut self) -> GenerationReport {
        profiling::scope!("Engine::step");
        let (w, h) = (self.target.width, self.target.height);

        // 1+2: mutate and score every member, lowest score wins, first index on ties
        let mut winner = 0usize;
        let mut generation_best = u64::MAX;
        for (i, member) in self.population.iter_mut().enumerate() {
            let mutated = self.mutator.mutate(std::mem::take(member), w, h);
            let score = distance(&self.target, &CpuRenderer::render(&mutated, w, h));
            *member = mutated;
            if i == 0 || score < generation_best {
                generation_best = score;
                winner = i;
            }
        }

        // 3: strictly better only
        let improved = generation_best < self.best_score;
        if improved {
            self.best_circles = self.population[winner].clone();
            self.best_score = generation_best;
            tracing::debug!(
                generation = self.generation,
                score = generation_best,
                circles = self.best_circles.len(),
                "new best"
            );
        }

        self.generation += 1;
        let generation = self.generation;
        self.best.update(|state| {
            if improved {
                state.circles = self.best_circles.clone();
                state.score = self.best_score;
                state.improved_at = generation;
            }
            state.generation = generation;
        });

        // 4: everyone restarts from the incumbent
        for member in &mut self.population {
            member.clone_from(&self.best_circles);
        }

        GenerationReport {
            generation,
            generation_best,
            best_score: self.best_score,
            best_len: self.best_circles.len(),
            improved,
        }
    }

    /// Loop generations until `should_stop` returns true for a report.
    /// Returns the number of generations run by this call.
    pub fn run<F>(&mut self, mut should_stop: F) -> u64
    where
        F: FnMut(&GenerationReport) -> bool,
    {
        let start = self.generation;
        loop {
            let report = self.step();
            if should_stop(&report) {
                break;
            }
        }
        self.generation - start
    }
}
