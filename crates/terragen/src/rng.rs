//! Deterministic random helpers shared by the generator stages.

use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;

/// Generator used throughout the crate.
pub type TerrainRng = Mcg128Xsl64;

/// Create the generator for a settings seed.
#[must_use]
pub fn seeded(seed: u64) -> TerrainRng {
    Mcg128Xsl64::seed_from_u64(seed)
}

/// Uniform sample in `[-1, 1)`.
pub fn signed_unit(rng: &mut impl Rng) -> f32 {
    rng.random_range(-1.0_f32..1.0)
}

/// Uniform sample in `[-amplitude, amplitude)`.
///
/// A zero or negative amplitude yields zero without consuming randomness.
pub fn signed(rng: &mut impl Rng, amplitude: f32) -> f32 {
    if amplitude <= 0.0 {
        return 0.0;
    }
    signed_unit(rng) * amplitude
}
