pub mod grid;

pub use grid::Grid;

/// Explicit description of a lattice as consumed by
/// [`LatticeModel::initialize`](crate::LatticeModel::initialize).
///
/// Node ids are 1-based, matching the plain-text input files.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LatticeSpec {
    /// `(node, field)` pairs.
    pub sites: Vec<(usize, f64)>,
    /// `(node, node, coupling)` triples.
    pub bonds: Vec<(usize, usize, f64)>,
}
