//! Error and secret distributions.
//!
//! Discrete Gaussian sampling over Z for error terms, plus the ternary and
//! uniform distributions used for secrets, encryption randomness and the
//! random halves of keys.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Default Gaussian standard deviation
pub const DEFAULT_SIGMA: f64 = 3.2;

/// Discrete Gaussian sampler over Z using rejection sampling.
///
/// Also owns the RNG for the other distributions a key generator or
/// encryptor needs, so one seed pins every random choice.
#[derive(Clone)]
pub struct GaussianSampler {
    /// Standard deviation σ
    sigma: f64,
    /// Tailcut: reject samples beyond this many standard deviations
    tailcut: usize,
    rng: ChaCha20Rng,
}

impl GaussianSampler {
    /// Create a sampler seeded from OS entropy
    pub fn new(sigma: f64) -> Self {
        Self::from_rng(sigma, ChaCha20Rng::from_entropy())
    }

    /// Create a sampler with a fixed seed for reproducible sampling
    pub fn with_seed(sigma: f64, seed: u64) -> Self {
        Self::from_rng(sigma, ChaCha20Rng::seed_from_u64(seed))
    }

    fn from_rng(sigma: f64, rng: ChaCha20Rng) -> Self {
        let tailcut = (sigma * 6.0).ceil() as usize;
        Self {
            sigma,
            tailcut,
            rng,
        }
    }

    /// Get the standard deviation
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Sample a single value from the discrete Gaussian D_σ
    pub fn sample(&mut self) -> i64 {
        let sigma_sq_2 = 2.0 * self.sigma * self.sigma;
        let bound = self.tailcut as i64;

        loop {
            let x = self.rng.gen_range(-bound..=bound);

            // Accept with probability proportional to exp(-x²/(2σ²))
            let prob = (-((x * x) as f64) / sigma_sq_2).exp();
            let u: f64 = self.rng.gen();
            if u < prob {
                return x;
            }
        }
    }

    /// Sample a vector of Gaussian values
    pub fn sample_vec(&mut self, len: usize) -> Vec<i64> {
        (0..len).map(|_| self.sample()).collect()
    }

    /// Sample a vector with entries uniform in {-1, 0, 1}
    pub fn sample_ternary_vec(&mut self, len: usize) -> Vec<i64> {
        (0..len).map(|_| self.rng.gen_range(-1i64..=1)).collect()
    }

    /// Sample a vector with entries uniform in [0, q)
    pub fn sample_uniform_vec(&mut self, len: usize, q: u64) -> Vec<u64> {
        (0..len).map(|_| self.rng.gen_range(0..q)).collect()
    }
}

impl std::fmt::Debug for GaussianSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaussianSampler")
            .field("sigma", &self.sigma)
            .field("tailcut", &self.tailcut)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tailcut_bounds() {
        let mut sampler = GaussianSampler::new(DEFAULT_SIGMA);
        let bound = (6.0 * DEFAULT_SIGMA).ceil() as i64;
        for _ in 0..10_000 {
            let s = sampler.sample();
            assert!(s.abs() <= bound, "sample {} exceeds 6σ bound {}", s, bound);
        }
    }

    #[test]
    fn test_deterministic_seeding() {
        let mut a = GaussianSampler::with_seed(DEFAULT_SIGMA, 12345);
        let mut b = GaussianSampler::with_seed(DEFAULT_SIGMA, 12345);
        assert_eq!(a.sample_vec(64), b.sample_vec(64));
        assert_eq!(a.sample_ternary_vec(64), b.sample_ternary_vec(64));
        assert_eq!(a.sample_uniform_vec(64, 97), b.sample_uniform_vec(64, 97));
    }

    #[test]
    fn test_distribution_variance() {
        let mut sampler = GaussianSampler::with_seed(DEFAULT_SIGMA, 42);
        let n = 100_000;

        let samples = sampler.sample_vec(n);
        let mean: f64 = samples.iter().map(|&x| x as f64).sum::<f64>() / n as f64;
        let variance: f64 = samples
            .iter()
            .map(|&x| (x as f64 - mean).powi(2))
            .sum::<f64>()
            / n as f64;

        let expected = DEFAULT_SIGMA * DEFAULT_SIGMA;
        assert!(mean.abs() < 0.1, "mean {} too far from 0", mean);
        assert!(
            (variance - expected).abs() / expected < 0.1,
            "variance {} differs from {}",
            variance,
            expected
        );
    }

    #[test]
    fn test_ternary_support() {
        let mut sampler = GaussianSampler::with_seed(DEFAULT_SIGMA, 7);
        let values = sampler.sample_ternary_vec(3_000);
        assert!(values.iter().all(|v| (-1..=1).contains(v)));
        for target in -1..=1 {
            assert!(values.iter().filter(|&&v| v == target).count() > 800);
        }
    }

    #[test]
    fn test_uniform_below_modulus() {
        let mut sampler = GaussianSampler::with_seed(DEFAULT_SIGMA, 9);
        assert!(sampler.sample_uniform_vec(1_000, 17).iter().all(|&v| v < 17));
    }
}
