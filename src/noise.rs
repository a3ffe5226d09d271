//! Ornstein–Uhlenbeck exploration noise.
//!
//! Discrete-time mean-reverting process, one component per action dimension:
//!
//! ```text
//! dX = θ(μ − X) + σ·N(0, 1)
//! X  ← X + dX
//! ```
//!
//! Successive samples are correlated, which suits exploration in continuous
//! action spaces. The state persists across calls until [`OrnsteinUhlenbeck::reset`].

use burn::config::Config;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

/// Configuration for the Ornstein–Uhlenbeck process
#[derive(Config, Debug)]
pub struct OrnsteinUhlenbeckConfig {
    pub action_dim: usize,
    /// Long-run mean μ
    #[config(default = 0.0)]
    pub mu: f32,
    /// Reversion speed θ
    #[config(default = 0.15)]
    pub theta: f32,
    /// Noise magnitude σ
    #[config(default = 0.2)]
    pub sigma: f32,
    /// Seed for the Gaussian increments; entropy-seeded when `None`
    #[config(default = "None")]
    pub seed: Option<u64>,
}

impl OrnsteinUhlenbeckConfig {
    pub fn init(&self) -> OrnsteinUhlenbeck {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        OrnsteinUhlenbeck {
            mu: self.mu,
            theta: self.theta,
            sigma: self.sigma,
            x: vec![self.mu; self.action_dim],
            rng,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrnsteinUhlenbeck {
    mu: f32,
    theta: f32,
    sigma: f32,
    x: Vec<f32>,
    rng: StdRng,
}

impl OrnsteinUhlenbeck {
    /// Advance the process one step and return the new state.
    pub fn sample(&mut self) -> &[f32] {
        for x in self.x.iter_mut() {
            let z: f32 = StandardNormal.sample(&mut self.rng);
            *x += self.theta * (self.mu - *x) + self.sigma * z;
        }
        &self.x
    }

    /// Put the state back at the mean.
    pub fn reset(&mut self) {
        self.x.fill(self.mu);
    }

    pub fn state(&self) -> &[f32] {
        &self.x
    }

    pub fn dim(&self) -> usize {
        self.x.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_mean() {
        let noise = OrnsteinUhlenbeckConfig::new(3).with_mu(1.5).init();
        assert_eq!(noise.state(), &[1.5, 1.5, 1.5]);
        assert_eq!(noise.dim(), 3);
    }

    #[test]
    fn test_zero_sigma_stays_at_mean() {
        let mut noise = OrnsteinUhlenbeckConfig::new(4).with_sigma(0.0).init();
        for _ in 0..10 {
            assert_eq!(noise.sample(), &[0.0; 4]);
        }
    }

    #[test]
    fn test_zero_sigma_reverts_monotonically() {
        let mut noise = OrnsteinUhlenbeckConfig::new(2)
            .with_mu(2.0)
            .with_sigma(0.0)
            .init();
        noise.x = vec![12.0, -8.0];

        let mut previous: Vec<f32> = noise.state().iter().map(|x| (x - 2.0).abs()).collect();
        for _ in 0..100 {
            let distance: Vec<f32> = noise.sample().iter().map(|x| (x - 2.0).abs()).collect();
            for (d, p) in distance.iter().zip(&previous) {
                assert!(d <= p, "distance grew from {p} to {d}");
            }
            previous = distance;
        }
        assert!(previous.iter().all(|&d| d < 1e-3));
    }

    #[test]
    fn test_reset_returns_to_mean() {
        let mut noise = OrnsteinUhlenbeckConfig::new(5).with_seed(Some(7)).init();
        for _ in 0..20 {
            noise.sample();
        }
        assert!(noise.state().iter().any(|&x| x != 0.0));

        noise.reset();
        assert_eq!(noise.state(), &[0.0; 5]);
    }

    #[test]
    fn test_seeded_processes_agree() {
        let config = OrnsteinUhlenbeckConfig::new(3).with_seed(Some(42));
        let mut a = config.init();
        let mut b = config.init();
        for _ in 0..5 {
            assert_eq!(a.sample().to_vec(), b.sample().to_vec());
        }
    }

    #[test]
    fn test_samples_are_correlated() {
        // with theta < 1 consecutive samples share most of their value
        let mut noise = OrnsteinUhlenbeckConfig::new(1)
            .with_sigma(0.01)
            .with_seed(Some(3))
            .init();
        noise.x = vec![10.0];
        let next = noise.sample()[0];
        assert!((next - 8.5).abs() < 0.1, "{next}");
    }
}
