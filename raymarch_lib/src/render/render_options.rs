use crate::error::ConfigError;

use super::{ClipPlane, MarchOptions, RaymarchMode, Shading, StepPolicy};

/// Settings of a whole frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// `(width, height)` in pixels
    pub resolution: (usize, usize),
    /// Dispatch rows to the rayon thread pool
    pub multi_thread: bool,
    pub march: MarchOptions,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            resolution: (512, 512),
            multi_thread: true,
            march: MarchOptions::default(),
        }
    }
}

impl RenderOptions {
    pub fn builder() -> RenderOptionsBuilder {
        RenderOptionsBuilder::default()
    }

    pub fn pixel_count(&self) -> usize {
        self.resolution.0 * self.resolution.1
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return Err(ConfigError::ZeroResolution);
        }
        self.march.step_policy.validate()?;
        let threshold = self.march.termination_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::OutOfUnitRange {
                name: "termination_threshold",
                value: threshold,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RenderOptionsBuilder {
    options: RenderOptions,
}

impl RenderOptionsBuilder {
    pub fn resolution(mut self, resolution: (usize, usize)) -> Self {
        self.options.resolution = resolution;
        self
    }

    pub fn multi_thread(mut self, multi_thread: bool) -> Self {
        self.options.multi_thread = multi_thread;
        self
    }

    pub fn early_ray_termination(mut self, enabled: bool) -> Self {
        self.options.march.early_termination = enabled;
        self
    }

    pub fn termination_threshold(mut self, threshold: f32) -> Self {
        self.options.march.termination_threshold = threshold;
        self
    }

    pub fn mode(mut self, mode: RaymarchMode) -> Self {
        self.options.march.mode = mode;
        self
    }

    pub fn quality(mut self, quality: f32) -> Self {
        self.options.march.step_policy.quality = quality;
        self
    }

    pub fn step_policy(mut self, policy: StepPolicy) -> Self {
        self.options.march.step_policy = policy;
        self
    }

    pub fn shading(mut self, shading: Option<Shading>) -> Self {
        self.options.march.shading = shading;
        self
    }

    pub fn clip_plane(mut self, plane: Option<ClipPlane>) -> Self {
        self.options.march.clip_plane = plane;
        self
    }

    pub fn empty_space_skipping(mut self, enabled: bool) -> Self {
        self.options.march.empty_space_skipping = enabled;
        self
    }

    /// Validated options
    pub fn build(self) -> Result<RenderOptions, ConfigError> {
        self.options.validate()?;
        Ok(self.options)
    }

    /// Options without validation, for tests and benchmarks with known-good values
    pub fn build_unchecked(self) -> RenderOptions {
        self.options
    }
}
