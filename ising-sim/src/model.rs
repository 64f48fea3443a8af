use std::cell::Cell;
use std::fmt;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use tracing::{debug, warn};
use validator::Validate;

use crate::config::{GridConfig, MAX_SITES};
use crate::error::{Error, Result};
use crate::geometry::{Grid, LatticeSpec};
use crate::spins::energy::{compute_energy, local_delta};
use crate::spins::{encode_state, place_weights, state_is_exact, Flip, Spin, SpinAlphabet};

/// The most recent `delta_to` query and its answer.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DeltaQuery<S> {
    site: usize,
    spin: S,
    delta: f64,
}

/// Graph-structured spin model with incremental energy bookkeeping.
///
/// Sites are 0-based. Each site carries a spin, an external field and a list
/// of `(neighbor, coupling)` pairs; every bond is stored in both endpoint
/// lists. The total energy
///
/// ```text
/// E = -Σ_bonds v_i v_j J_ij - Σ_i v_i h_i
/// ```
///
/// the base-`K` state fingerprint and the spin sum are maintained by
/// [`flip_to`](Self::flip_to) and never recomputed after construction.
///
/// A model owns its own PRNG, used for the initial configuration and by the
/// sweep loop. It is not `Sync`: one chain, one owner.
#[derive(Debug, Clone)]
pub struct LatticeModel<S: SpinAlphabet = Spin> {
    spins: Vec<S>,
    fields: Vec<f64>,
    neighbors: Vec<Vec<(usize, f64)>>,
    energy: f64,
    state: u128,
    magnetization_sum: f64,
    /// `weights[i] = K^(n-1-i)`, the fingerprint digit weight of site `i`.
    weights: Vec<u128>,
    valid: bool,
    last_delta: Cell<Option<DeltaQuery<S>>>,
    pub(crate) rng: Xoshiro256StarStar,
}

impl<S: SpinAlphabet> Default for LatticeModel<S> {
    /// An empty, invalid model. Sweeps on it fail with [`Error::InvalidModel`].
    fn default() -> Self {
        Self {
            spins: Vec::new(),
            fields: Vec::new(),
            neighbors: Vec::new(),
            energy: 0.0,
            state: 0,
            magnetization_sum: 0.0,
            weights: Vec::new(),
            valid: false,
            last_delta: Cell::new(None),
            rng: Xoshiro256StarStar::seed_from_u64(0),
        }
    }
}

fn make_rng(seed: Option<u64>) -> Xoshiro256StarStar {
    match seed {
        Some(seed) => Xoshiro256StarStar::seed_from_u64(seed),
        None => Xoshiro256StarStar::from_entropy(),
    }
}

/// Sort by node id (ties by field), drop exact duplicates and resolve
/// conflicting records for the same node to the last one in that order.
fn normalize_sites(spin_fields: &[(usize, f64)]) -> Result<Vec<(usize, f64)>> {
    let mut sites = spin_fields.to_vec();
    sites.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
    sites.dedup_by(|a, b| a.0 == b.0 && a.1 == b.1);

    let mut out: Vec<(usize, f64)> = Vec::with_capacity(sites.len());
    for (node, field) in sites {
        if node == 0 {
            return Err(Error::InvalidInput(
                "node ids are 1-based, got node 0".to_string(),
            ));
        }
        if !field.is_finite() {
            return Err(Error::InvalidInput(format!(
                "field of node {node} is not finite"
            )));
        }
        match out.last_mut() {
            Some(last) if last.0 == node => {
                warn!(node, kept = field, dropped = last.1, "conflicting field records");
                last.1 = field;
            }
            _ => out.push((node, field)),
        }
    }
    Ok(out)
}

fn check_bonds(bonds: &[(usize, usize, f64)], n_spins: usize) -> Result<()> {
    for &(i, j, coupling) in bonds {
        for node in [i, j] {
            if node == 0 || node > n_spins {
                return Err(Error::InvalidInput(format!(
                    "bond ({i}, {j}) references node {node} outside 1..={n_spins}"
                )));
            }
        }
        if i == j {
            return Err(Error::InvalidInput(format!("self-bond on node {i}")));
        }
        if !coupling.is_finite() {
            return Err(Error::InvalidInput(format!(
                "coupling of bond ({i}, {j}) is not finite"
            )));
        }
    }
    Ok(())
}

impl<S: SpinAlphabet> LatticeModel<S> {
    /// Build a model from explicit spin/field and bond lists (1-based ids).
    ///
    /// The site count is the largest node id in `spin_fields`; nodes without a
    /// record get zero field. Every spin starts in a uniformly random state.
    /// `seed = None` draws the PRNG seed from OS entropy.
    pub fn initialize(
        spin_fields: &[(usize, f64)],
        bonds: &[(usize, usize, f64)],
        seed: Option<u64>,
    ) -> Result<Self> {
        Self::with_rng(spin_fields, bonds, make_rng(seed))
    }

    /// Like [`initialize`](Self::initialize) with a caller-provided PRNG.
    pub fn with_rng(
        spin_fields: &[(usize, f64)],
        bonds: &[(usize, usize, f64)],
        mut rng: Xoshiro256StarStar,
    ) -> Result<Self> {
        let sites = normalize_sites(spin_fields)?;
        let n_spins = sites.last().map(|&(node, _)| node).ok_or_else(|| {
            Error::InvalidInput("spin list is empty".to_string())
        })?;
        if n_spins > MAX_SITES {
            return Err(Error::InvalidInput(format!(
                "node {n_spins} exceeds the limit of {MAX_SITES} sites"
            )));
        }
        check_bonds(bonds, n_spins)?;

        let spins: Vec<S> = (0..n_spins).map(|_| S::random(&mut rng)).collect();

        let mut fields = vec![0.0f64; n_spins];
        for &(node, field) in &sites {
            fields[node - 1] = field;
        }

        let mut neighbors: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n_spins];
        for &(i, j, coupling) in bonds {
            neighbors[i - 1].push((j - 1, coupling));
            neighbors[j - 1].push((i - 1, coupling));
        }

        let energy = compute_energy(
            &spins,
            &fields,
            bonds.iter().map(|&(i, j, e)| (i - 1, j - 1, e)),
        );
        let state = encode_state(&spins);
        let magnetization_sum = spins.iter().map(|s| s.value_of()).sum();

        debug!(
            n_spins,
            n_bonds = bonds.len(),
            energy,
            "initialized lattice model"
        );

        Ok(Self {
            spins,
            fields,
            neighbors,
            energy,
            state,
            magnetization_sum,
            weights: place_weights::<S>(n_spins),
            valid: true,
            last_delta: Cell::new(None),
            rng,
        })
    }

    /// Build a model from a [`LatticeSpec`].
    pub fn from_spec(spec: &LatticeSpec, seed: Option<u64>) -> Result<Self> {
        Self::initialize(&spec.sites, &spec.bonds, seed)
    }

    /// `rows × cols` open-boundary grid with zero field and uniform
    /// `bond_energy` on right and down bonds.
    pub fn from_grid(rows: usize, cols: usize, bond_energy: f64, seed: Option<u64>) -> Result<Self> {
        Self::from_grid_config(&GridConfig::new(rows, cols, bond_energy), seed)
    }

    /// Square `n × n` shorthand for [`from_grid`](Self::from_grid).
    pub fn from_square_grid(n: usize, bond_energy: f64, seed: Option<u64>) -> Result<Self> {
        Self::from_grid_config(&GridConfig::square(n, bond_energy), seed)
    }

    pub fn from_grid_config(config: &GridConfig, seed: Option<u64>) -> Result<Self> {
        config.validate()?;
        let spec = Grid::new(config.rows, config.cols).to_spec(config.bond_energy);
        Self::from_spec(&spec, seed)
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn site_count(&self) -> usize {
        self.spins.len()
    }

    pub fn spins(&self) -> &[S] {
        &self.spins
    }

    pub fn spin(&self, site: usize) -> S {
        self.spins[site]
    }

    pub fn fields(&self) -> &[f64] {
        &self.fields
    }

    /// `(neighbor, coupling)` pairs of `site`.
    pub fn neighbors(&self, site: usize) -> &[(usize, f64)] {
        &self.neighbors[site]
    }

    /// Every stored bond once, as `(i, j, coupling)` with `i < j`.
    pub fn bonds(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.neighbors.iter().enumerate().flat_map(|(i, nbs)| {
            nbs.iter()
                .filter(move |&&(j, _)| i < j)
                .map(move |&(j, e)| (i, j, e))
        })
    }

    /// The fields and bonds of this model as 1-based lists, e.g. to build
    /// fresh chains on the same lattice.
    pub fn to_spec(&self) -> LatticeSpec {
        LatticeSpec {
            sites: self
                .fields
                .iter()
                .enumerate()
                .map(|(i, &h)| (i + 1, h))
                .collect(),
            bonds: self.bonds().map(|(i, j, e)| (i + 1, j + 1, e)).collect(),
        }
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Base-`K` fingerprint of the configuration, site 0 most significant.
    pub fn state(&self) -> u128 {
        self.state
    }

    /// Whether [`state`](Self::state) is injective for this site count.
    pub fn state_is_exact(&self) -> bool {
        state_is_exact::<S>(self.site_count())
    }

    /// Mean spin value. Zero for an empty model.
    pub fn magnetization(&self) -> f64 {
        if self.spins.is_empty() {
            return 0.0;
        }
        self.magnetization_sum / self.spins.len() as f64
    }

    /// Energy of the current configuration summed from scratch.
    pub fn recompute_energy(&self) -> f64 {
        compute_energy(&self.spins, &self.fields, self.bonds())
    }

    /// Energy change if `site` were set to `new_spin`. O(degree).
    ///
    /// The last query is memoized per model; a repeated query with the same
    /// `(site, new_spin)` returns the stored value. Any flip clears it.
    pub fn delta_to(&self, site: usize, new_spin: S) -> f64 {
        if let Some(q) = self.last_delta.get() {
            if q.site == site && q.spin == new_spin {
                return q.delta;
            }
        }

        let delta = local_delta(
            self.spins[site],
            new_spin,
            self.fields[site],
            self.neighbors[site]
                .iter()
                .map(|&(j, coupling)| (self.spins[j], coupling)),
        );
        self.last_delta.set(Some(DeltaQuery {
            site,
            spin: new_spin,
            delta,
        }));
        delta
    }

    /// Set `site` to `new_spin`, updating energy, fingerprint and spin sum.
    pub fn flip_to(&mut self, site: usize, new_spin: S) {
        let delta = self.delta_to(site, new_spin);
        let old_spin = self.spins[site];
        let weight = self.weights[site];

        self.spins[site] = new_spin;
        self.energy += delta;
        self.magnetization_sum += new_spin.value_of() - old_spin.value_of();
        self.state = self
            .state
            .wrapping_sub(weight.wrapping_mul(old_spin.index_of() as u128))
            .wrapping_add(weight.wrapping_mul(new_spin.index_of() as u128));
        self.last_delta.set(None);
    }
}

impl<S: Flip> LatticeModel<S> {
    /// Energy change of flipping `site` to the opposite state.
    #[inline]
    pub fn delta(&self, site: usize) -> f64 {
        self.delta_to(site, self.spins[site].flipped())
    }

    /// Flip `site` to the opposite state.
    #[inline]
    pub fn flip(&mut self, site: usize) {
        let new_spin = self.spins[site].flipped();
        self.flip_to(site, new_spin);
    }
}

const RULE: &str = "--------------------------------------------------------------";

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{RULE}")?;
    writeln!(f, "{title:^62}")?;
    writeln!(f, "{RULE}")
}

/// Three-section dump (spins, fields, bonds) with 1-based node ids.
impl<S: SpinAlphabet> fmt::Display for LatticeModel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, "Spins")?;
        for (i, s) in self.spins.iter().enumerate() {
            write!(f, "{} : {:<8}", i + 1, s.name_of())?;
            if (i + 1) % 5 == 0 {
                writeln!(f)?;
            }
        }
        writeln!(f)?;

        heading(f, "Fields")?;
        for (i, h) in self.fields.iter().enumerate() {
            write!(f, "{} : {:<8}", i + 1, h)?;
            if (i + 1) % 5 == 0 {
                writeln!(f)?;
            }
        }
        writeln!(f)?;

        heading(f, "Bonds")?;
        for (k, (i, j, e)) in self.bonds().enumerate() {
            write!(f, "({:<2}, {:>2}) : {:<6}", i + 1, j + 1, e)?;
            if (k + 1) % 4 == 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spins::{decode_state, SpinOne};

    fn chain3() -> LatticeModel<Spin> {
        // 1 ── 2 ── 3, fields 0.5, 0, -0.25
        LatticeModel::initialize(
            &[(1, 0.5), (2, 0.0), (3, -0.25)],
            &[(1, 2, 1.0), (2, 3, -2.0)],
            Some(11),
        )
        .unwrap()
    }

    #[test]
    fn test_default_is_invalid() {
        let model = LatticeModel::<Spin>::default();
        assert!(!model.is_valid());
        assert_eq!(model.site_count(), 0);
        assert_eq!(model.magnetization(), 0.0);
    }

    #[test]
    fn test_initialize_bookkeeping() {
        let model = chain3();
        assert!(model.is_valid());
        assert_eq!(model.site_count(), 3);
        assert_eq!(model.fields(), &[0.5, 0.0, -0.25]);
        assert_eq!(model.neighbors(1), &[(0, 1.0), (2, -2.0)]);
        assert!((model.energy() - model.recompute_energy()).abs() < 1e-12);
        assert_eq!(decode_state::<Spin>(model.state(), 3), model.spins().to_vec());
        let mean: f64 = model.spins().iter().map(|s| s.value_of()).sum::<f64>() / 3.0;
        assert_eq!(model.magnetization(), mean);
    }

    #[test]
    fn test_site_count_is_max_node() {
        // Node 2 has no record and gets zero field.
        let model =
            LatticeModel::<Spin>::initialize(&[(3, 1.0), (1, 2.0)], &[(1, 3, 1.0)], Some(1))
                .unwrap();
        assert_eq!(model.site_count(), 3);
        assert_eq!(model.fields(), &[2.0, 0.0, 1.0]);
        assert!(model.neighbors(1).is_empty());
    }

    #[test]
    fn test_duplicate_sites_are_normalized() {
        let model = LatticeModel::<Spin>::initialize(
            &[(2, 1.0), (1, 0.5), (2, 1.0), (2, 3.0)],
            &[],
            Some(1),
        )
        .unwrap();
        assert_eq!(model.site_count(), 2);
        assert_eq!(model.fields(), &[0.5, 3.0]);
        assert!((model.energy() - model.recompute_energy()).abs() < 1e-12);
    }

    #[test]
    fn test_input_errors() {
        let bad = [
            LatticeModel::<Spin>::initialize(&[], &[], None),
            LatticeModel::<Spin>::initialize(&[(0, 1.0)], &[], None),
            LatticeModel::<Spin>::initialize(&[(1, 0.0), (2, 0.0)], &[(1, 3, 1.0)], None),
            LatticeModel::<Spin>::initialize(&[(1, 0.0), (2, 0.0)], &[(2, 2, 1.0)], None),
            LatticeModel::<Spin>::initialize(&[(1, f64::NAN)], &[], None),
            LatticeModel::<Spin>::from_grid(0, 3, 1.0, None),
        ];
        for result in bad {
            assert!(result.is_err());
        }
    }

    #[test]
    fn test_oversized_models_are_rejected() {
        let huge = LatticeModel::<Spin>::from_grid(1 << 32, 1 << 32, 1.0, Some(1));
        assert!(matches!(huge, Err(Error::Config(_))));

        let huge = LatticeModel::<Spin>::initialize(&[(usize::MAX, 0.0)], &[], Some(1));
        assert!(matches!(huge, Err(Error::InvalidInput(_))));

        let huge = LatticeModel::<Spin>::initialize(&[(MAX_SITES + 1, 0.0)], &[], Some(1));
        assert!(matches!(huge, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_grid_model() {
        let model = LatticeModel::<Spin>::from_grid(2, 3, 1.0, Some(5)).unwrap();
        assert_eq!(model.site_count(), 6);
        assert!(model.fields().iter().all(|&h| h == 0.0));

        let mut edges: Vec<(usize, usize)> = model.bonds().map(|(i, j, _)| (i, j)).collect();
        edges.sort_unstable();
        assert_eq!(
            edges,
            vec![(0, 1), (0, 3), (1, 2), (1, 4), (2, 5), (3, 4), (4, 5)]
        );
        assert!(model.bonds().all(|(_, _, e)| e == 1.0));

        let square = LatticeModel::<Spin>::from_square_grid(3, 1.0, Some(5)).unwrap();
        assert_eq!(square.site_count(), 9);
        assert_eq!(square.bonds().count(), 12);
    }

    #[test]
    fn test_same_seed_same_configuration() {
        let a = LatticeModel::<Spin>::from_square_grid(6, 1.0, Some(99)).unwrap();
        let b = LatticeModel::<Spin>::from_square_grid(6, 1.0, Some(99)).unwrap();
        assert_eq!(a.spins(), b.spins());
        assert_eq!(a.state(), b.state());
    }

    #[test]
    fn test_flip_updates_everything() {
        let mut model = chain3();
        for site in [0, 2, 1, 1, 0] {
            let before = model.energy();
            let d = model.delta(site);
            model.flip(site);
            assert!((model.energy() - before - d).abs() < 1e-12);
            assert!((model.energy() - model.recompute_energy()).abs() < 1e-12);
            assert_eq!(decode_state::<Spin>(model.state(), 3), model.spins().to_vec());
        }
    }

    #[test]
    fn test_delta_sign_convention() {
        // Aligned ferromagnet: every single flip costs energy.
        let mut model = LatticeModel::<Spin>::from_grid(2, 2, 1.0, Some(3)).unwrap();
        for site in 0..4 {
            if model.spin(site) == Spin::Down {
                model.flip(site);
            }
        }
        assert_eq!(model.energy(), -4.0);
        assert_eq!(model.magnetization(), 1.0);
        for site in 0..4 {
            // two bonds per corner site
            assert_eq!(model.delta(site), 4.0);
        }
    }

    #[test]
    fn test_delta_is_pure_and_cached() {
        let model = chain3();
        let spins = model.spins().to_vec();
        let energy = model.energy();
        let d1 = model.delta(1);
        let d2 = model.delta(1);
        assert_eq!(d1, d2);
        assert_eq!(model.spins(), &spins[..]);
        assert_eq!(model.energy(), energy);
    }

    #[test]
    fn test_cache_cleared_by_flip() {
        let mut model = chain3();
        let stale = model.delta(0);
        // Flipping a neighbor changes site 0's local field.
        model.flip(1);
        let fresh = local_delta(
            model.spin(0),
            model.spin(0).flipped(),
            model.fields()[0],
            model.neighbors(0).iter().map(|&(j, c)| (model.spin(j), c)),
        );
        assert_eq!(model.delta(0), fresh);
        assert_ne!(stale, fresh);
    }

    #[test]
    fn test_flip_to_same_spin_is_noop() {
        let mut model = chain3();
        let energy = model.energy();
        let state = model.state();
        let current = model.spin(2);
        assert_eq!(model.delta_to(2, current), 0.0);
        model.flip_to(2, current);
        assert_eq!(model.energy(), energy);
        assert_eq!(model.state(), state);
    }

    #[test]
    fn test_spin_one_model() {
        let mut model = LatticeModel::<SpinOne>::from_grid(2, 2, 1.0, Some(8)).unwrap();
        let targets = [SpinOne::Zero, SpinOne::Up, SpinOne::Down, SpinOne::Zero];
        for (site, &s) in targets.iter().enumerate() {
            let before = model.energy();
            let d = model.delta_to(site, s);
            model.flip_to(site, s);
            assert!((model.energy() - before - d).abs() < 1e-12);
        }
        assert_eq!(model.spins(), &targets);
        // [zero, up, down, zero] in base 3: 1*27 + 0*9 + 2*3 + 1 = 34
        assert_eq!(model.state(), 34);
        assert_eq!(model.magnetization(), 0.0);
        assert!((model.energy() - model.recompute_energy()).abs() < 1e-12);
    }

    #[test]
    fn test_display_sections() {
        let text = chain3().to_string();
        assert!(text.contains("Spins"));
        assert!(text.contains("Fields"));
        assert!(text.contains("Bonds"));
        assert!(text.contains("(1 ,  2) : 1"));
    }
}
