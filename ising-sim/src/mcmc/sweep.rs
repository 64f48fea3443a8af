use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;
use validator::Validate;

use crate::config::{SiteOrder, SweepConfig, STABILIZE_SWEEPS};
use crate::error::{Error, Result};
use crate::model::LatticeModel;
use crate::recorder::{Observer, Pass};
use crate::spins::Flip;

/// Metropolis acceptance test for an energy change `delta` at inverse
/// temperature `beta`.
///
/// Downhill and flat moves are always taken. An uphill move is taken when
/// `exp(-beta * delta)` exceeds a uniform draw from `[0, 1)`, so with
/// `beta = +inf` it never is.
#[inline]
pub fn metropolis_accept<R: Rng + ?Sized>(delta: f64, beta: f64, rng: &mut R) -> bool {
    if delta <= 0.0 {
        return true;
    }
    (-beta * delta).exp() > rng.gen::<f64>()
}

/// Counters for one call to [`LatticeModel::run_sweeps`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepStats {
    pub sweeps: usize,
    pub proposals: usize,
    pub accepted: usize,
}

impl SweepStats {
    pub fn acceptance_rate(&self) -> f64 {
        if self.proposals == 0 {
            return 0.0;
        }
        self.accepted as f64 / self.proposals as f64
    }
}

impl<S: Flip> LatticeModel<S> {
    /// One proposal: flip `site` if the Metropolis test passes.
    #[inline]
    fn propose(&mut self, site: usize, beta: f64) -> bool {
        let delta = self.delta(site);
        if metropolis_accept(delta, beta, &mut self.rng) {
            self.flip(site);
            true
        } else {
            false
        }
    }

    /// Run `sweep_count` Metropolis sweeps.
    ///
    /// Each sweep makes `site_count` single-spin-flip proposals, with sites
    /// chosen according to `config.site_order`, then calls
    /// `observer.observe` once. The observer therefore sees exactly
    /// `sweep_count` calls whatever the acceptance outcomes.
    pub fn run_sweeps<O: Observer<S> + ?Sized>(
        &mut self,
        config: &SweepConfig,
        observer: &mut O,
        sweep_count: usize,
    ) -> Result<SweepStats> {
        config.validate()?;
        if !self.is_valid() {
            return Err(Error::InvalidModel);
        }

        let n_spins = self.site_count();
        let beta = config.beta;
        let mut stats = SweepStats::default();
        let mut order: Vec<usize> = match config.site_order {
            SiteOrder::Random => Vec::new(),
            SiteOrder::Shuffled => (0..n_spins).collect(),
        };

        debug!(sweep_count, beta, site_order = ?config.site_order, "starting sweeps");

        for _ in 0..sweep_count {
            match config.site_order {
                SiteOrder::Random => {
                    for _ in 0..n_spins {
                        let site = self.rng.gen_range(0..n_spins);
                        stats.accepted += self.propose(site, beta) as usize;
                    }
                }
                SiteOrder::Shuffled => {
                    order.shuffle(&mut self.rng);
                    for &site in order.iter() {
                        stats.accepted += self.propose(site, beta) as usize;
                    }
                }
            }
            stats.proposals += n_spins;
            stats.sweeps += 1;
            observer.observe(self);
        }

        debug!(
            sweeps = stats.sweeps,
            accepted = stats.accepted,
            energy = self.energy(),
            "finished sweeps"
        );
        Ok(stats)
    }

    /// Discard [`STABILIZE_SWEEPS`] sweeps to move away from the random
    /// initial configuration. Not an equilibration check.
    pub fn stabilize(&mut self, config: &SweepConfig) -> Result<SweepStats> {
        self.run_sweeps(config, &mut Pass, STABILIZE_SWEEPS)
    }
}
