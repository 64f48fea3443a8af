pub mod energy;

use std::fmt::Debug;

use rand::Rng;

use crate::error::{Error, Result};

/// A closed alphabet of discrete spin states.
///
/// The engine is generic over this trait, so a model over a different
/// alphabet reuses the same bookkeeping and sweep code. `STATES` lists the
/// valid states in index order: `STATES[s.index_of()] == s`.
pub trait SpinAlphabet: Copy + Eq + Debug + Send + Sync + 'static {
    const STATES: &'static [Self];

    /// Number of valid states, the base `K` of the state fingerprint.
    fn state_count() -> usize {
        Self::STATES.len()
    }

    fn value_of(self) -> f64;

    /// Inverse of [`value_of`](Self::value_of). Values outside the alphabet
    /// are rejected rather than mapped to a default state.
    fn from_value(value: f64) -> Result<Self> {
        Self::STATES
            .iter()
            .copied()
            .find(|s| s.value_of() == value)
            .ok_or(Error::InvalidSpinValue(value))
    }

    fn index_of(self) -> usize;

    fn name_of(self) -> &'static str;

    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::STATES[rng.gen_range(0..Self::STATES.len())]
    }
}

/// Alphabets where "the opposite state" is well defined, enabling the
/// single-argument `delta`/`flip` and the Metropolis sweep.
pub trait Flip: SpinAlphabet {
    /// The state whose value is the negation of `self`'s.
    fn flipped(self) -> Self;
}

/// Binary Ising spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Spin {
    Up,
    Down,
}

impl SpinAlphabet for Spin {
    const STATES: &'static [Self] = &[Spin::Up, Spin::Down];

    #[inline]
    fn value_of(self) -> f64 {
        match self {
            Spin::Up => 1.0,
            Spin::Down => -1.0,
        }
    }

    fn from_value(value: f64) -> Result<Self> {
        if value == 1.0 {
            Ok(Spin::Up)
        } else if value == -1.0 {
            Ok(Spin::Down)
        } else {
            Err(Error::InvalidSpinValue(value))
        }
    }

    #[inline]
    fn index_of(self) -> usize {
        match self {
            Spin::Up => 0,
            Spin::Down => 1,
        }
    }

    fn name_of(self) -> &'static str {
        match self {
            Spin::Up => "up",
            Spin::Down => "down",
        }
    }
}

impl Flip for Spin {
    #[inline]
    fn flipped(self) -> Self {
        match self {
            Spin::Up => Spin::Down,
            Spin::Down => Spin::Up,
        }
    }
}

/// Spin-1 alphabet (+1, 0, −1), as used by Blume–Capel style models.
///
/// Sweeps over a `SpinOne` model keep the set of zero sites fixed; see the
/// [`Flip`] impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpinOne {
    Up,
    Zero,
    Down,
}

impl SpinAlphabet for SpinOne {
    const STATES: &'static [Self] = &[SpinOne::Up, SpinOne::Zero, SpinOne::Down];

    #[inline]
    fn value_of(self) -> f64 {
        match self {
            SpinOne::Up => 1.0,
            SpinOne::Zero => 0.0,
            SpinOne::Down => -1.0,
        }
    }

    #[inline]
    fn index_of(self) -> usize {
        match self {
            SpinOne::Up => 0,
            SpinOne::Zero => 1,
            SpinOne::Down => 2,
        }
    }

    fn name_of(self) -> &'static str {
        match self {
            SpinOne::Up => "up",
            SpinOne::Zero => "zero",
            SpinOne::Down => "down",
        }
    }
}

/// Negation maps `Zero` to itself, so `flip` and the Metropolis sweep
/// never create or remove a zero spin: they only move between `Up` and
/// `Down` on the sites that are nonzero. Reaching `Zero` takes an explicit
/// [`flip_to`](crate::LatticeModel::flip_to).
impl Flip for SpinOne {
    #[inline]
    fn flipped(self) -> Self {
        match self {
            SpinOne::Up => SpinOne::Down,
            SpinOne::Zero => SpinOne::Zero,
            SpinOne::Down => SpinOne::Up,
        }
    }
}

/// Positional weight of each site in the base-`K` fingerprint:
/// `weights[i] = K^(n - 1 - i)`, wrapping modulo 2^128.
pub fn place_weights<S: SpinAlphabet>(n_spins: usize) -> Vec<u128> {
    let base = S::state_count() as u128;
    let mut weights = vec![1u128; n_spins];
    for i in (0..n_spins.saturating_sub(1)).rev() {
        weights[i] = weights[i + 1].wrapping_mul(base);
    }
    weights
}

/// Base-`K` encoding of a configuration, site 0 most significant.
pub fn encode_state<S: SpinAlphabet>(spins: &[S]) -> u128 {
    let base = S::state_count() as u128;
    spins.iter().fold(0u128, |acc, s| {
        acc.wrapping_mul(base).wrapping_add(s.index_of() as u128)
    })
}

/// Inverse of [`encode_state`] for `n_spins` sites.
///
/// Only meaningful when `state_is_exact::<S>(n_spins)`; past that the
/// fingerprint has wrapped and the leading digits are lost.
pub fn decode_state<S: SpinAlphabet>(mut state: u128, n_spins: usize) -> Vec<S> {
    let base = S::state_count() as u128;
    let mut spins = Vec::with_capacity(n_spins);
    for _ in 0..n_spins {
        spins.push(S::STATES[(state % base) as usize]);
        state /= base;
    }
    spins.reverse();
    spins
}

/// Whether every configuration of `n_spins` sites has a distinct fingerprint,
/// i.e. `K^n_spins - 1` fits in a `u128`.
pub fn state_is_exact<S: SpinAlphabet>(n_spins: usize) -> bool {
    let base = S::state_count() as u128;
    let mut max_state = 0u128;
    for _ in 0..n_spins {
        match max_state
            .checked_mul(base)
            .and_then(|m| m.checked_add(base - 1))
        {
            Some(m) => max_state = m,
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    #[test]
    fn test_spin_value_roundtrip() {
        for &s in Spin::STATES {
            assert_eq!(Spin::from_value(s.value_of()).unwrap(), s);
            assert_eq!(Spin::STATES[s.index_of()], s);
        }
        for &s in SpinOne::STATES {
            assert_eq!(SpinOne::from_value(s.value_of()).unwrap(), s);
            assert_eq!(SpinOne::STATES[s.index_of()], s);
        }
    }

    #[test]
    fn test_invalid_spin_value() {
        assert!(matches!(
            Spin::from_value(0.0),
            Err(Error::InvalidSpinValue(v)) if v == 0.0
        ));
        assert!(SpinOne::from_value(0.5).is_err());
        assert!(SpinOne::from_value(0.0).is_ok());
    }

    #[test]
    fn test_flip_negates_value() {
        for &s in Spin::STATES {
            assert_eq!(s.flipped().value_of(), -s.value_of());
        }
        for &s in SpinOne::STATES {
            assert_eq!(s.flipped().value_of(), -s.value_of());
        }
    }

    #[test]
    fn test_random_spin_covers_alphabet() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(7);
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[SpinOne::random(&mut rng).index_of()] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn test_encode_decode() {
        // up down down up -> 0b0110
        let spins = [Spin::Up, Spin::Down, Spin::Down, Spin::Up];
        let state = encode_state(&spins);
        assert_eq!(state, 6);
        assert_eq!(decode_state::<Spin>(state, 4), spins.to_vec());

        // base 3: [down, up, zero] -> 2*9 + 0*3 + 1 = 19
        let spins = [SpinOne::Down, SpinOne::Up, SpinOne::Zero];
        assert_eq!(encode_state(&spins), 19);
        assert_eq!(decode_state::<SpinOne>(19, 3), spins.to_vec());
    }

    #[test]
    fn test_place_weights() {
        assert_eq!(place_weights::<Spin>(4), vec![8, 4, 2, 1]);
        assert_eq!(place_weights::<SpinOne>(3), vec![9, 3, 1]);
        assert!(place_weights::<Spin>(0).is_empty());
    }

    #[test]
    fn test_state_is_exact() {
        assert!(state_is_exact::<Spin>(128));
        assert!(!state_is_exact::<Spin>(129));
        assert!(state_is_exact::<SpinOne>(80));
        assert!(!state_is_exact::<SpinOne>(81));
    }
}
