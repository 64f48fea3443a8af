//! Post-processing of drained recorder series.

pub mod autocorrelation;
pub mod histogram;
pub mod summary;

pub use autocorrelation::{autocorrelation, sokal_tau};
pub use histogram::Histogram;
pub use summary::Summary;
