use validator::{Validate, ValidationError};

/// Inverse temperature used when the caller doesn't pick one.
pub const DEFAULT_BETA: f64 = 0.1;

/// Coupling assigned to every generated grid bond by default.
pub const DEFAULT_BOND_ENERGY: f64 = 1.0;

/// Number of discarded sweeps performed by `stabilize`.
pub const STABILIZE_SWEEPS: usize = 10;

/// Largest site count a model can be built with (a 2048 × 2048 grid).
pub const MAX_SITES: usize = 1 << 22;

/// How a sweep chooses the sites it proposes to flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiteOrder {
    /// `site_count` uniform draws with replacement.
    #[default]
    Random,
    /// A fresh random permutation per sweep, every site visited once.
    Shuffled,
}

impl TryFrom<&str> for SiteOrder {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "random" => Ok(Self::Random),
            "shuffled" => Ok(Self::Shuffled),
            _ => Err(format!(
                "unknown site_order '{s}', expected 'random' or 'shuffled'"
            )),
        }
    }
}

fn validate_sweep_config(cfg: &SweepConfig) -> Result<(), ValidationError> {
    if cfg.beta.is_nan() {
        return Err(ValidationError::new("beta must be a number"));
    }
    if cfg.beta < 0.0 {
        return Err(ValidationError::new("beta must be >= 0"));
    }
    Ok(())
}

/// Parameters read by every Metropolis sweep.
#[derive(Debug, Clone, Copy, PartialEq, Validate)]
#[validate(schema(function = "validate_sweep_config"))]
pub struct SweepConfig {
    /// Inverse temperature β = 1/kT. `f64::INFINITY` is allowed and rejects
    /// every uphill move.
    pub beta: f64,
    pub site_order: SiteOrder,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            beta: DEFAULT_BETA,
            site_order: SiteOrder::Random,
        }
    }
}

impl SweepConfig {
    pub fn with_beta(beta: f64) -> Self {
        Self {
            beta,
            ..Self::default()
        }
    }
}

fn validate_grid_config(cfg: &GridConfig) -> Result<(), ValidationError> {
    if cfg.rows < 1 || cfg.cols < 1 {
        return Err(ValidationError::new("grid rows and cols must be >= 1"));
    }
    match cfg.rows.checked_mul(cfg.cols) {
        Some(n) if n <= MAX_SITES => {}
        _ => return Err(ValidationError::new("grid has more than MAX_SITES sites")),
    }
    if !cfg.bond_energy.is_finite() {
        return Err(ValidationError::new("bond_energy must be finite"));
    }
    Ok(())
}

/// Shape and coupling of a generated rectangular lattice.
#[derive(Debug, Clone, Copy, PartialEq, Validate)]
#[validate(schema(function = "validate_grid_config"))]
pub struct GridConfig {
    pub rows: usize,
    pub cols: usize,
    pub bond_energy: f64,
}

impl GridConfig {
    pub fn new(rows: usize, cols: usize, bond_energy: f64) -> Self {
        Self {
            rows,
            cols,
            bond_energy,
        }
    }

    pub fn square(n: usize, bond_energy: f64) -> Self {
        Self::new(n, n, bond_energy)
    }
}
