use super::LatticeSpec;

/// Open-boundary rectangular lattice.
///
/// Sites are indexed in row-major order. Each site bonds to its right and
/// down neighbors when they exist; there is no wraparound.
///
/// ```text
///  0 ─ 1 ─ 2
///  │   │   │
///  3 ─ 4 ─ 5
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
    /// Total number of sites (`rows * cols`, saturating).
    pub n_spins: usize,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            n_spins: rows.saturating_mul(cols),
        }
    }

    /// Right neighbor of `flat_idx`, if it isn't in the last column.
    #[inline]
    pub fn right(&self, flat_idx: usize) -> Option<usize> {
        let r = flat_idx + 1;
        (r % self.cols != 0).then_some(r)
    }

    /// Down neighbor of `flat_idx`, if it isn't in the last row.
    #[inline]
    pub fn down(&self, flat_idx: usize) -> Option<usize> {
        let d = flat_idx + self.cols;
        (d < self.n_spins).then_some(d)
    }

    /// Number of undirected bonds: `rows*(cols-1) + (rows-1)*cols`.
    pub fn n_bonds(&self) -> usize {
        if self.n_spins == 0 {
            return 0;
        }
        self.rows * (self.cols - 1) + (self.rows - 1) * self.cols
    }

    /// Spin/bond lists describing this grid, 1-based like input files.
    ///
    /// Every site gets zero field and every bond the same `bond_energy`.
    /// Bonds are emitted site by site, right before down.
    pub fn to_spec(&self, bond_energy: f64) -> LatticeSpec {
        let sites = (1..=self.n_spins).map(|n| (n, 0.0)).collect();

        let mut bonds = Vec::with_capacity(self.n_bonds());
        for i in 0..self.n_spins {
            if let Some(r) = self.right(i) {
                bonds.push((i + 1, r + 1, bond_energy));
            }
            if let Some(d) = self.down(i) {
                bonds.push((i + 1, d + 1, bond_energy));
            }
        }

        LatticeSpec { sites, bonds }
    }
}
