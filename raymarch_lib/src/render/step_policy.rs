use nalgebra::Vector3;

use crate::error::ConfigError;

/// Step length and step count of the raymarcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepPolicy {
    /// Step multiplier, `2.0` takes twice as many samples
    pub quality: f32,
    /// Accumulated opacity after which only `tail_steps` more samples are taken
    pub near_opaque: f32,
    pub tail_steps: usize,
    /// Hard cap of steps per ray
    pub max_steps: usize,
}

impl Default for StepPolicy {
    fn default() -> Self {
        StepPolicy {
            quality: 1.0,
            near_opaque: 0.95,
            tail_steps: 4,
            max_steps: 4096,
        }
    }
}

impl StepPolicy {
    pub fn new(
        quality: f32,
        near_opaque: f32,
        tail_steps: usize,
        max_steps: usize,
    ) -> Result<StepPolicy, ConfigError> {
        let policy = StepPolicy {
            quality,
            near_opaque,
            tail_steps,
            max_steps,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.quality.is_finite() || self.quality <= 0.0 {
            return Err(ConfigError::NotPositive {
                name: "quality",
                value: self.quality,
            });
        }
        if !(0.0..=1.0).contains(&self.near_opaque) {
            return Err(ConfigError::OutOfUnitRange {
                name: "near_opaque",
                value: self.near_opaque,
            });
        }
        Ok(())
    }

    /// World length of one step.
    ///
    /// Ray crosses one voxel layer of its dominant axis per step at quality 1,
    /// so every voxel along the ray gets at least one sample.
    /// `local_direction` is the unit ray direction in volume-local space.
    pub fn base_step(&self, spacing: &Vector3<f32>, local_direction: &Vector3<f32>) -> f32 {
        let min_spacing = spacing.min();

        // layers crossed per unit of length, along each axis
        let crossing = local_direction.abs().component_div(spacing);
        let dominant = crossing.max();

        let step = if dominant.is_finite() && dominant > 0.0 {
            1.0 / dominant
        } else {
            min_spacing
        };

        let step = if step.is_finite() && step > 0.0 {
            step
        } else {
            min_spacing
        };

        step / self.quality
    }

    /// Number of samples taken over an interval, capped by `max_steps`
    pub fn step_budget(&self, interval_length: f32, step: f32) -> usize {
        if !interval_length.is_finite() || interval_length < 0.0 || !step.is_finite() || step <= 0.0 {
            return 0;
        }
        let steps = (interval_length / step).floor() + 1.0;
        if steps >= self.max_steps as f32 {
            self.max_steps
        } else {
            steps as usize
        }
    }

    /// Remaining steps after a sample was composited
    pub fn shrink_budget(&self, accum_opacity: f32, remaining: usize) -> usize {
        if accum_opacity >= self.near_opaque {
            remaining.min(self.tail_steps)
        } else {
            remaining
        }
    }
}

#[cfg(test)]
mod test {
    use nalgebra::vector;

    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-5,
            "actual {actual}, expected {expected}"
        );
    }

    #[test]
    fn axis_aligned_ray_steps_one_voxel() {
        let policy = StepPolicy::default();
        let spacing = vector![0.5, 0.5, 2.0];

        assert_close(policy.base_step(&spacing, &vector![0.0, 0.0, 1.0]), 2.0);
        assert_close(policy.base_step(&spacing, &vector![-1.0, 0.0, 0.0]), 0.5);
    }

    #[test]
    fn diagonal_ray_steps_voxel_diagonal() {
        let policy = StepPolicy::default();
        let dir = vector![1.0, 1.0, 1.0].normalize();

        assert_close(
            policy.base_step(&vector![1.0, 1.0, 1.0], &dir),
            f32::sqrt(3.0),
        );
    }

    #[test]
    fn quality_scales_step() {
        let policy = StepPolicy {
            quality: 4.0,
            ..Default::default()
        };

        assert_close(
            policy.base_step(&vector![1.0, 1.0, 1.0], &vector![0.0, 1.0, 0.0]),
            0.25,
        );
    }

    #[test]
    fn degenerate_direction_falls_back() {
        let policy = StepPolicy::default();

        assert_close(
            policy.base_step(&vector![0.3, 0.2, 0.7], &vector![0.0, 0.0, 0.0]),
            0.2,
        );
    }

    #[test]
    fn budget() {
        let policy = StepPolicy {
            max_steps: 10,
            ..Default::default()
        };

        assert_eq!(policy.step_budget(1.0, 0.25), 5);
        assert_eq!(policy.step_budget(0.0, 0.25), 1);
        assert_eq!(policy.step_budget(100.0, 0.25), 10);
        assert_eq!(policy.step_budget(1.0, 0.0), 0);
        assert_eq!(policy.step_budget(-1.0, 0.25), 0);
    }

    #[test]
    fn shrink_when_near_opaque() {
        let policy = StepPolicy::default();

        assert_eq!(policy.shrink_budget(0.5, 100), 100);
        assert_eq!(policy.shrink_budget(0.96, 100), 4);
        assert_eq!(policy.shrink_budget(0.96, 2), 2);
    }

    #[test]
    fn invalid_policy() {
        assert_eq!(
            StepPolicy::new(0.0, 0.9, 4, 100),
            Err(ConfigError::NotPositive {
                name: "quality",
                value: 0.0
            })
        );
        assert!(StepPolicy::new(1.0, 1.5, 4, 100).is_err());
        assert!(StepPolicy::new(1.0, 0.9, 4, 100).is_ok());
    }
}
