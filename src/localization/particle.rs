//! Particles and the fixed-size particle set

use std::ops::Deref;

use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::common::{LocalizationError, LocalizationResult, Pose2D};
use crate::mapping::FieldGeometry;

/// One pose hypothesis; heading in degrees within [0, 360)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub weight: f64,
}

impl Particle {
    pub fn new(x: f64, y: f64, heading: f64, weight: f64) -> Self {
        Particle { x, y, heading, weight }
    }

    pub fn pose(&self) -> Pose2D {
        Pose2D::new(self.x, self.y, self.heading)
    }
}

/// Ordered set of exactly `N` particles. `N` never changes after creation.
#[derive(Debug, Clone)]
pub struct ParticleSet {
    particles: Vec<Particle>,
}

impl ParticleSet {
    /// Wrap existing particles; the set must not be empty
    pub fn from_particles(particles: Vec<Particle>) -> LocalizationResult<Self> {
        if particles.is_empty() {
            return Err(LocalizationError::InvalidParameter(
                "particle set must hold at least one particle".to_string(),
            ));
        }
        Ok(ParticleSet { particles })
    }

    /// `n` particles spread uniformly over the field extent and all headings,
    /// each weighted `1/n`
    pub fn uniform<R: Rng + ?Sized>(
        n: usize,
        geometry: &FieldGeometry,
        rng: &mut R,
    ) -> LocalizationResult<Self> {
        if n == 0 {
            return Err(LocalizationError::InvalidParameter(
                "particle count must be positive".to_string(),
            ));
        }
        geometry.validate()?;

        let half_w = geometry.field_width / 2.0;
        let half_h = geometry.field_height / 2.0;
        let x_dist = Uniform::new(-half_w, half_w);
        let y_dist = Uniform::new(-half_h, half_h);
        let heading_dist = Uniform::new(0.0, 360.0);
        let weight = 1.0 / n as f64;

        let particles = (0..n)
            .map(|_| {
                Particle::new(
                    x_dist.sample(rng),
                    y_dist.sample(rng),
                    heading_dist.sample(rng),
                    weight,
                )
            })
            .collect();

        Ok(ParticleSet { particles })
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Particle> {
        self.particles.iter_mut()
    }

    pub fn total_weight(&self) -> f64 {
        self.particles.iter().map(|p| p.weight).sum()
    }

    /// Divide every weight by the total when it is positive; returns the total
    pub fn normalize_weights(&mut self) -> f64 {
        let sum_w = self.total_weight();
        if sum_w > 0.0 {
            for p in self.particles.iter_mut() {
                p.weight /= sum_w;
            }
        }
        sum_w
    }

    /// Swap in a new generation; panics if its size differs
    pub fn replace(&mut self, generation: Vec<Particle>) {
        assert_eq!(generation.len(), self.particles.len(), "particle count must stay fixed");
        self.particles = generation;
    }
}

impl Deref for ParticleSet {
    type Target = [Particle];

    fn deref(&self) -> &Self::Target {
        &self.particles
    }
}
