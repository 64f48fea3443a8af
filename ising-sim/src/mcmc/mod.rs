pub mod sweep;

pub use sweep::{metropolis_accept, SweepStats};
