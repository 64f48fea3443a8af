use super::SpinAlphabet;

/// Total energy of a configuration, computed from scratch.
///
/// `bonds` holds each undirected bond once as `(i, j, coupling)` with 0-based
/// site ids.
///
/// ```text
/// E = -Σ_bonds v_i v_j J_ij - Σ_i v_i h_i
/// ```
pub fn compute_energy<S: SpinAlphabet>(
    spins: &[S],
    fields: &[f64],
    bonds: impl IntoIterator<Item = (usize, usize, f64)>,
) -> f64 {
    let mut total = 0.0f64;
    for (s, &h) in spins.iter().zip(fields.iter()) {
        total -= s.value_of() * h;
    }
    for (i, j, coupling) in bonds {
        total -= spins[i].value_of() * spins[j].value_of() * coupling;
    }
    total
}

/// Energy change of replacing `old` by `new` at a site with field `field`,
/// given the neighbor `(spin, coupling)` pairs of that site.
///
/// O(degree): only the local field of the site enters.
#[inline]
pub fn local_delta<S: SpinAlphabet>(
    old: S,
    new: S,
    field: f64,
    neighbors: impl IntoIterator<Item = (S, f64)>,
) -> f64 {
    let spin_delta = new.value_of() - old.value_of();
    if spin_delta == 0.0 {
        return 0.0;
    }
    let mut h = field;
    for (s, coupling) in neighbors {
        h += s.value_of() * coupling;
    }
    -spin_delta * h
}
