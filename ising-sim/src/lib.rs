//! Graph-structured Ising model with single-spin-flip Metropolis dynamics.
//!
//! A [`LatticeModel`] holds spins, external fields and symmetric bonds, and
//! keeps its energy, base-`K` state fingerprint and magnetization up to date
//! as spins flip. [`LatticeModel::run_sweeps`] drives the Metropolis chain
//! and hands the model to an [`Observer`] after every sweep; the recorders in
//! [`recorder`] turn that into time series.

pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
pub mod mcmc;
pub mod model;
pub mod recorder;
pub mod simulation;
pub mod spins;
pub mod statistics;

pub use config::{
    GridConfig, SiteOrder, SweepConfig, DEFAULT_BETA, DEFAULT_BOND_ENERGY, MAX_SITES,
};
pub use error::{Error, Result};
pub use geometry::{Grid, LatticeSpec};
pub use mcmc::SweepStats;
pub use model::LatticeModel;
pub use recorder::{
    CompositeRecorder, EnergyRecorder, MagnetizationRecorder, Observation, Observer, Pass,
    Recorder, StateRecorder,
};
pub use simulation::{run_chains, Chain, ChainResult};
pub use spins::{Flip, Spin, SpinAlphabet, SpinOne};
