//! Resampling strategies and pose estimators

use itertools::{Itertools, MinMaxResult};
use ordered_float::OrderedFloat;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::common::Pose2D;
use crate::localization::{Particle, ParticleSet};

/// How the weighted particle set turns into a pose estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResamplingStrategy {
    /// Low-variance resampling followed by a circular mean
    #[default]
    LowVariance,
    /// Min-max normalized weighted mean, the set is kept as is
    MinMaxWeighted,
}

/// Result of one resampling pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampleOutcome {
    /// Estimate published to observers
    pub mean: Pose2D,
    /// Highest-weight particle among the draws, low-variance only
    pub best: Option<Particle>,
}

impl ResamplingStrategy {
    pub fn resample<R: Rng + ?Sized>(&self, particles: &mut ParticleSet, rng: &mut R) -> ResampleOutcome {
        match self {
            ResamplingStrategy::LowVariance => {
                let step = 1.0 / particles.len() as f64;
                let r = Uniform::new(0.0, step).sample(rng);
                let (generation, best) = low_variance_draw(particles, r);
                let mean = mean_pose(&generation);
                particles.replace(generation);
                ResampleOutcome { mean, best: Some(best) }
            }
            ResamplingStrategy::MinMaxWeighted => ResampleOutcome {
                mean: min_max_weighted_estimate(particles),
                best: None,
            },
        }
    }
}

/// Low-variance draw of `particles.len()` particles with offset `r ∈ [0, 1/N)`.
///
/// Returns the new generation, copied with their current weights, and the
/// highest-weight particle seen while drawing. The cursor never moves past the
/// last particle, so weights summing to less than one still yield `N` draws.
pub fn low_variance_draw(particles: &[Particle], r: f64) -> (Vec<Particle>, Particle) {
    let n = particles.len();
    let step = 1.0 / n as f64;
    let mut generation = Vec::with_capacity(n);

    let mut c = particles[0].weight;
    let mut id = 0;
    let mut best = particles[0];

    for j in 0..n {
        let u = r + j as f64 * step;
        while u > c && id + 1 < n {
            id += 1;
            c += particles[id].weight;
        }
        let chosen = particles[id];
        if chosen.weight > best.weight {
            best = chosen;
        }
        generation.push(chosen);
    }

    (generation, best)
}

/// Circular mean of headings in degrees, in (-180, 180]
pub fn circular_mean_deg<I: IntoIterator<Item = f64>>(headings: I) -> f64 {
    let (sin_sum, cos_sum) = headings.into_iter().fold((0.0, 0.0), |(s, c), h| {
        let rad = h.to_radians();
        (s + rad.sin(), c + rad.cos())
    });
    sin_sum.atan2(cos_sum).to_degrees()
}

/// Arithmetic mean position and circular mean heading
pub fn mean_pose(particles: &[Particle]) -> Pose2D {
    if particles.is_empty() {
        return Pose2D::origin();
    }
    let n = particles.len() as f64;
    let mean_x = particles.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_y = particles.iter().map(|p| p.y).sum::<f64>() / n;
    Pose2D::new(mean_x, mean_y, circular_mean_deg(particles.iter().map(|p| p.heading)))
}

/// Normalize weights in place to `(w - w_min) / (w_max - w_min)` and return
/// the weighted mean scaled by `1/N`. A flat weight distribution maps every
/// weight to one.
pub fn min_max_weighted_estimate(particles: &mut ParticleSet) -> Pose2D {
    let (w_min, w_max) = match particles.iter().map(|p| OrderedFloat(p.weight)).minmax() {
        MinMaxResult::NoElements => return Pose2D::origin(),
        MinMaxResult::OneElement(w) => (w.0, w.0),
        MinMaxResult::MinMax(lo, hi) => (lo.0, hi.0),
    };
    let range = w_max - w_min;

    let mut bel = Pose2D::origin();
    for p in particles.iter_mut() {
        p.weight = if range > 0.0 { (p.weight - w_min) / range } else { 1.0 };
        bel.x += p.weight * p.x;
        bel.y += p.weight * p.y;
        bel.heading += p.weight * p.heading;
    }

    let inv_n = 1.0 / particles.len() as f64;
    Pose2D::new(bel.x * inv_n, bel.y * inv_n, bel.heading * inv_n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn weighted(weights: &[f64]) -> ParticleSet {
        ParticleSet::from_particles(
            weights
                .iter()
                .enumerate()
                .map(|(i, &w)| Particle::new(i as f64, -(i as f64), (i * 30) as f64, w))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_draw_keeps_size_and_copies_inputs() {
        let set = weighted(&[0.1, 0.4, 0.2, 0.3]);
        for r in [0.0, 0.1, 0.2499] {
            let (generation, _) = low_variance_draw(&set, r);
            assert_eq!(generation.len(), 4);
            for p in &generation {
                assert!(set.iter().any(|q| q == p));
            }
        }
    }

    #[test]
    fn test_draw_is_proportional() {
        let set = weighted(&[0.5, 0.25, 0.25, 0.0]);
        let (generation, best) = low_variance_draw(&set, 0.1);
        let xs: Vec<f64> = generation.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 0.0, 1.0, 2.0]);
        assert_eq!(best, set[0]);
    }

    #[test]
    fn test_single_winner_collapses_generation() {
        let set = weighted(&[0.0, 0.0, 1.0, 0.0, 0.0]);
        let mut rng = StdRng::seed_from_u64(42);
        let mut resampled = set.clone();
        let outcome = ResamplingStrategy::LowVariance.resample(&mut resampled, &mut rng);

        assert_eq!(resampled.len(), 5);
        for p in resampled.iter() {
            assert_eq!(p.pose(), set[2].pose());
        }
        assert_eq!(outcome.best, Some(set[2]));
        assert_relative_eq!(outcome.mean.x, 2.0);
        assert_relative_eq!(outcome.mean.heading, 60.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unnormalized_weights_do_not_overrun() {
        let set = weighted(&[0.01, 0.01, 0.01]);
        let (generation, _) = low_variance_draw(&set, 0.3);
        assert_eq!(generation.len(), 3);
        assert_eq!(generation[2], set[2]);
    }

    #[test]
    fn test_circular_mean_wraps() {
        assert_relative_eq!(circular_mean_deg([10.0, 350.0]), 0.0, epsilon = 1e-9);
        assert_relative_eq!(circular_mean_deg([90.0, 180.0]), 135.0, epsilon = 1e-9);
        assert_relative_eq!(circular_mean_deg([170.0, 200.0]), -175.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mean_pose() {
        let particles = [
            Particle::new(0.0, 10.0, 350.0, 0.5),
            Particle::new(4.0, 20.0, 10.0, 0.5),
        ];
        let mean = mean_pose(&particles);
        assert_relative_eq!(mean.x, 2.0);
        assert_relative_eq!(mean.y, 15.0);
        assert_relative_eq!(mean.heading, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_min_max_uses_true_minimum() {
        let mut set = ParticleSet::from_particles(vec![
            Particle::new(10.0, 0.0, 0.0, 0.2),
            Particle::new(20.0, 4.0, 90.0, 0.6),
            Particle::new(30.0, 8.0, 180.0, 1.0),
        ])
        .unwrap();
        let estimate = min_max_weighted_estimate(&mut set);

        let normalized: Vec<f64> = set.iter().map(|p| p.weight).collect();
        assert_relative_eq!(normalized[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(normalized[1], 0.5, epsilon = 1e-12);
        assert_relative_eq!(normalized[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(estimate.x, (0.5 * 20.0 + 30.0) / 3.0, epsilon = 1e-9);
        assert_relative_eq!(estimate.y, (0.5 * 4.0 + 8.0) / 3.0, epsilon = 1e-9);
        assert_relative_eq!(estimate.heading, (0.5 * 90.0 + 180.0) / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_min_max_flat_weights() {
        let mut set = weighted(&[0.25; 4]);
        let estimate = ResamplingStrategy::MinMaxWeighted.resample(&mut set, &mut StdRng::seed_from_u64(0));
        assert!(set.iter().all(|p| p.weight == 1.0));
        assert_relative_eq!(estimate.mean.x, 1.5);
        assert_eq!(estimate.best, None);
    }
}
