//! Per-sweep observers.
//!
//! The sweep loop only knows about [`Observer`]: it hands the model to
//! `observe` once per completed sweep. [`Recorder`]s are observers that keep
//! what they saw until drained, and [`CompositeRecorder`] bundles several of
//! them so one sweep loop fills several aligned time series.

use crate::error::{Error, Result};
use crate::model::LatticeModel;
use crate::spins::SpinAlphabet;

/// Called once per completed sweep with a read-only view of the model.
pub trait Observer<S: SpinAlphabet> {
    fn observe(&mut self, model: &LatticeModel<S>);
}

/// One recorded sample, tagged with the quantity it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    Energy(f64),
    State(u128),
    Magnetization(f64),
}

/// An observer that accumulates one sample per observation.
pub trait Recorder<S: SpinAlphabet>: Observer<S> {
    /// Number of samples held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the held samples in observation order and start over empty.
    fn drain_observations(&mut self) -> Vec<Observation>;
}

/// Observes nothing and keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pass;

impl<S: SpinAlphabet> Observer<S> for Pass {
    #[inline]
    fn observe(&mut self, _model: &LatticeModel<S>) {}
}

impl<S: SpinAlphabet> Recorder<S> for Pass {
    fn len(&self) -> usize {
        0
    }

    fn drain_observations(&mut self) -> Vec<Observation> {
        Vec::new()
    }
}

/// Records `energy()` after every sweep.
#[derive(Debug, Clone, Default)]
pub struct EnergyRecorder {
    energies: Vec<f64>,
}

impl EnergyRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<f64> {
        std::mem::take(&mut self.energies)
    }
}

impl<S: SpinAlphabet> Observer<S> for EnergyRecorder {
    fn observe(&mut self, model: &LatticeModel<S>) {
        self.energies.push(model.energy());
    }
}

impl<S: SpinAlphabet> Recorder<S> for EnergyRecorder {
    fn len(&self) -> usize {
        self.energies.len()
    }

    fn drain_observations(&mut self) -> Vec<Observation> {
        self.drain().into_iter().map(Observation::Energy).collect()
    }
}

/// Records the state fingerprint after every sweep.
#[derive(Debug, Clone, Default)]
pub struct StateRecorder {
    states: Vec<u128>,
}

impl StateRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<u128> {
        std::mem::take(&mut self.states)
    }
}

impl<S: SpinAlphabet> Observer<S> for StateRecorder {
    fn observe(&mut self, model: &LatticeModel<S>) {
        self.states.push(model.state());
    }
}

impl<S: SpinAlphabet> Recorder<S> for StateRecorder {
    fn len(&self) -> usize {
        self.states.len()
    }

    fn drain_observations(&mut self) -> Vec<Observation> {
        self.drain().into_iter().map(Observation::State).collect()
    }
}

/// Records the mean magnetization after every sweep.
#[derive(Debug, Clone, Default)]
pub struct MagnetizationRecorder {
    magnetizations: Vec<f64>,
}

impl MagnetizationRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<f64> {
        std::mem::take(&mut self.magnetizations)
    }
}

impl<S: SpinAlphabet> Observer<S> for MagnetizationRecorder {
    fn observe(&mut self, model: &LatticeModel<S>) {
        self.magnetizations.push(model.magnetization());
    }
}

impl<S: SpinAlphabet> Recorder<S> for MagnetizationRecorder {
    fn len(&self) -> usize {
        self.magnetizations.len()
    }

    fn drain_observations(&mut self) -> Vec<Observation> {
        self.drain()
            .into_iter()
            .map(Observation::Magnetization)
            .collect()
    }
}

/// Several recorders driven by one observation stream.
///
/// `drain` zips the members' series index-wise into one row per sweep:
/// `rows[t][k]` is member `k`'s sample from sweep `t`.
pub struct CompositeRecorder<S: SpinAlphabet> {
    members: Vec<Box<dyn Recorder<S> + Send>>,
}

impl<S: SpinAlphabet> Default for CompositeRecorder<S> {
    fn default() -> Self {
        Self {
            members: Vec::new(),
        }
    }
}

impl<S: SpinAlphabet> CompositeRecorder<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, recorder: impl Recorder<S> + Send + 'static) -> Self {
        self.push(recorder);
        self
    }

    pub fn push(&mut self, recorder: impl Recorder<S> + Send + 'static) {
        self.members.push(Box::new(recorder));
    }

    /// Number of member recorders, the width of each drained row.
    pub fn width(&self) -> usize {
        self.members.len()
    }

    /// Number of sweeps observed, if every member agrees on it.
    pub fn len(&self) -> Result<usize> {
        let expected = self.members.first().map_or(0, |m| m.len());
        for (member, m) in self.members.iter().enumerate() {
            if m.len() != expected {
                return Err(Error::RecorderLengthMismatch {
                    member,
                    expected,
                    found: m.len(),
                });
            }
        }
        Ok(expected)
    }

    pub fn is_empty(&self) -> bool {
        self.members.iter().all(|m| m.is_empty())
    }

    /// One row per sweep, members in insertion order.
    ///
    /// Fails without draining anything if the members hold different numbers
    /// of samples.
    pub fn drain(&mut self) -> Result<Vec<Vec<Observation>>> {
        let n_sweeps = self.len()?;
        let series: Vec<Vec<Observation>> = self
            .members
            .iter_mut()
            .map(|m| m.drain_observations())
            .collect();

        let mut rows = Vec::with_capacity(n_sweeps);
        for t in 0..n_sweeps {
            rows.push(series.iter().map(|s| s[t]).collect());
        }
        Ok(rows)
    }
}

impl<S: SpinAlphabet> Observer<S> for CompositeRecorder<S> {
    fn observe(&mut self, model: &LatticeModel<S>) {
        for m in self.members.iter_mut() {
            m.observe(model);
        }
    }
}
