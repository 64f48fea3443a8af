//! Independent chains run side by side.
//!
//! Each chain owns its model, PRNG and sweep configuration, so chains at
//! different temperatures never share state. Chains don't exchange
//! configurations.

use rayon::prelude::*;
use tracing::debug;

use crate::config::SweepConfig;
use crate::error::Result;
use crate::geometry::LatticeSpec;
use crate::mcmc::SweepStats;
use crate::model::LatticeModel;
use crate::recorder::{CompositeRecorder, EnergyRecorder, MagnetizationRecorder, Observation};
use crate::spins::Flip;
use crate::statistics::Summary;

/// One Markov chain: a model and the configuration its sweeps run with.
#[derive(Debug, Clone)]
pub struct Chain<S: Flip> {
    pub model: LatticeModel<S>,
    pub config: SweepConfig,
}

/// Everything recorded by one chain in [`run_chains`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChainResult {
    pub beta: f64,
    pub stats: SweepStats,
    pub energies: Vec<f64>,
    pub magnetizations: Vec<f64>,
    pub energy: Summary,
    /// Summary of |m|, which stays informative when the chain tunnels
    /// between the two ordered states.
    pub abs_magnetization: Summary,
}

impl<S: Flip> Chain<S> {
    pub fn new(model: LatticeModel<S>, config: SweepConfig) -> Self {
        Self { model, config }
    }

    /// Stabilize, then record energy and magnetization for `sweep_count`
    /// sweeps.
    pub fn run(&mut self, sweep_count: usize) -> Result<ChainResult> {
        self.model.stabilize(&self.config)?;

        let mut recorder = CompositeRecorder::new()
            .with(EnergyRecorder::new())
            .with(MagnetizationRecorder::new());
        let stats = self
            .model
            .run_sweeps(&self.config, &mut recorder, sweep_count)?;

        let mut energies = Vec::with_capacity(sweep_count);
        let mut magnetizations = Vec::with_capacity(sweep_count);
        for row in recorder.drain()? {
            if let [Observation::Energy(e), Observation::Magnetization(m)] = row.as_slice() {
                energies.push(*e);
                magnetizations.push(*m);
            }
        }
        let abs_m: Vec<f64> = magnetizations.iter().map(|m| m.abs()).collect();

        Ok(ChainResult {
            beta: self.config.beta,
            stats,
            energy: Summary::from_series(&energies),
            abs_magnetization: Summary::from_series(&abs_m),
            energies,
            magnetizations,
        })
    }
}

/// One chain per inverse temperature on the same lattice.
///
/// Chain `i` is seeded with `base_seed + i`, or from entropy when
/// `base_seed` is `None`.
pub fn chains_for_betas<S: Flip>(
    spec: &LatticeSpec,
    betas: &[f64],
    base: SweepConfig,
    base_seed: Option<u64>,
) -> Result<Vec<Chain<S>>> {
    betas
        .iter()
        .enumerate()
        .map(|(i, &beta)| {
            let model = LatticeModel::from_spec(spec, base_seed.map(|s| s.wrapping_add(i as u64)))?;
            Ok(Chain::new(model, SweepConfig { beta, ..base }))
        })
        .collect()
}

/// Run every chain for `sweep_count` recorded sweeps, in parallel.
///
/// For a single chain the call is made directly, skipping rayon thread-pool
/// overhead. Results come back in chain order.
pub fn run_chains<S: Flip>(chains: &mut [Chain<S>], sweep_count: usize) -> Result<Vec<ChainResult>> {
    debug!(n_chains = chains.len(), sweep_count, "running chains");
    if chains.len() == 1 {
        return Ok(vec![chains[0].run(sweep_count)?]);
    }

    chains
        .par_iter_mut()
        .map(|chain| chain.run(sweep_count))
        .collect()
}
