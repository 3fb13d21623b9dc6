use nalgebra::{vector, Point3, Vector3};

use crate::{
    color::{self, RGBA},
    common::{OrientedBox, Ray},
    transfer_function::TransferFunction,
    volumetric::{texture_to_voxel, Volume},
};

use super::{EmptySpaceMap, StepPolicy};

/// Accumulated opacity at which a ray stops by default
pub const TERMINATION_THRESHOLD: f32 = 0.995;

/// Gradient magnitude under which a sample is left unshaded
const FLAT_GRADIENT: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RaymarchMode {
    /// Front-to-back compositing of transfer function colors
    #[default]
    Composite,
    /// Transfer function of the largest sample along the ray
    MaximumIntensity,
}

/// Lambert shading with one directional light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shading {
    /// Direction towards the light, world space
    pub light_dir: Vector3<f32>,
    /// Light reaching surfaces facing away from the light
    pub ambient: f32,
}

impl Default for Shading {
    fn default() -> Self {
        Shading {
            light_dir: vector![1.0, 1.0, 0.0].normalize(),
            ambient: 0.2,
        }
    }
}

/// Samples on the positive side of the plane (where `normal` points) are skipped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlane {
    pub point: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl ClipPlane {
    pub fn new(point: Point3<f32>, normal: Vector3<f32>) -> ClipPlane {
        ClipPlane { point, normal }
    }

    pub fn clips(&self, pos: &Point3<f32>) -> bool {
        (pos - self.point).dot(&self.normal) > 0.0
    }
}

/// Settings of a single ray traversal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchOptions {
    pub mode: RaymarchMode,
    pub step_policy: StepPolicy,
    pub early_termination: bool,
    pub termination_threshold: f32,
    pub shading: Option<Shading>,
    pub clip_plane: Option<ClipPlane>,
    /// Skip blocks invisible under the transfer function, composite mode only
    pub empty_space_skipping: bool,
}

impl Default for MarchOptions {
    fn default() -> Self {
        MarchOptions {
            mode: RaymarchMode::Composite,
            step_policy: StepPolicy::default(),
            early_termination: true,
            termination_threshold: TERMINATION_THRESHOLD,
            shading: None,
            clip_plane: None,
            empty_space_skipping: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarchPhase {
    Entering,
    Marching,
    Terminated,
}

/// Progress of one ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchState {
    /// Premultiplied color
    pub accum: RGBA,
    /// Distance of the next sample
    pub t: f32,
    pub t_far: f32,
    pub step: f32,
    pub remaining: usize,
    pub steps_taken: usize,
    /// Steps that read the volume
    pub samples_taken: usize,
    pub phase: MarchPhase,
    /// Largest sample so far, maximum intensity mode
    max_sample: Option<f32>,
}

impl MarchState {
    fn new() -> MarchState {
        MarchState {
            accum: color::zero(),
            t: 0.0,
            t_far: 0.0,
            step: 0.0,
            remaining: 0,
            steps_taken: 0,
            samples_taken: 0,
            phase: MarchPhase::Entering,
            max_sample: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.phase == MarchPhase::Terminated
    }
}

/// Traverses rays through one volume.
///
/// Pure function of ray, volume and transfer function, rays can be marched from any thread.
pub struct Raymarcher<'a, V, T>
where
    V: Volume + ?Sized,
    T: TransferFunction + ?Sized,
{
    volume: &'a V,
    bbox: OrientedBox,
    spacing: Vector3<f32>,
    tf: &'a T,
    options: MarchOptions,
    empty_space: Option<&'a EmptySpaceMap<'a>>,
}

impl<'a, V, T> Raymarcher<'a, V, T>
where
    V: Volume + ?Sized,
    T: TransferFunction + ?Sized,
{
    /// `bbox` is the world placement of the volume, `spacing` the voxel size
    pub fn new(
        volume: &'a V,
        bbox: OrientedBox,
        spacing: Vector3<f32>,
        tf: &'a T,
        options: MarchOptions,
    ) -> Raymarcher<'a, V, T> {
        Raymarcher {
            volume,
            bbox,
            spacing,
            tf,
            options,
            empty_space: None,
        }
    }

    /// Skip empty blocks of `map`, if enabled in options.
    /// `map` must be built for the same volume and transfer function.
    pub fn with_empty_space(mut self, map: &'a EmptySpaceMap<'a>) -> Raymarcher<'a, V, T> {
        self.empty_space = Some(map);
        self
    }

    pub fn options(&self) -> &MarchOptions {
        &self.options
    }

    /// Color of the ray, premultiplied by opacity
    pub fn march(&self, ray: &Ray) -> RGBA {
        let mut state = self.begin(ray);
        while !state.is_done() {
            self.advance(ray, &mut state);
        }
        state.accum
    }

    /// Enter the volume.
    /// Ray missing the volume is terminated right away, with transparent color.
    pub fn begin(&self, ray: &Ray) -> MarchState {
        let mut state = MarchState::new();

        let (t_near, t_far) = match self.bbox.intersect(ray) {
            Some(interval) => interval,
            None => {
                state.phase = MarchPhase::Terminated;
                return state;
            }
        };

        let policy = &self.options.step_policy;
        let local_dir = self.bbox.to_local_vector(&ray.direction);
        let step = policy.base_step(&self.spacing, &local_dir);

        state.t = t_near;
        state.t_far = t_far;
        state.step = step;
        state.remaining = policy.step_budget(t_far - t_near, step);
        state.phase = MarchPhase::Marching;
        state
    }

    /// Take one sample and move by one step
    pub fn advance(&self, ray: &Ray, state: &mut MarchState) {
        if state.phase != MarchPhase::Marching {
            return;
        }
        if state.t > state.t_far || state.remaining == 0 {
            self.finish(state);
            return;
        }

        let pos = ray.point_from_t(state.t);
        let clipped = self
            .options
            .clip_plane
            .map_or(false, |plane| plane.clips(&pos));

        if !clipped {
            let uvw = self.bbox.to_texture(&pos);
            let voxel = texture_to_voxel(uvw, self.volume.get_size());

            match self.options.mode {
                RaymarchMode::Composite => {
                    if !self.is_empty_space(&voxel) {
                        self.composite(voxel, state);
                        state.samples_taken += 1;
                    }
                }
                RaymarchMode::MaximumIntensity => {
                    let sample = self.volume.sample_at(voxel);
                    state.samples_taken += 1;
                    state.max_sample = Some(state.max_sample.map_or(sample, |m| m.max(sample)));
                }
            }
        }

        state.t += state.step;
        state.steps_taken += 1;
        state.remaining -= 1;

        if self.options.mode == RaymarchMode::Composite {
            state.remaining = self
                .options
                .step_policy
                .shrink_budget(state.accum.w, state.remaining);

            if self.options.early_termination && state.accum.w >= self.options.termination_threshold
            {
                self.finish(state);
            }
        }
    }

    fn is_empty_space(&self, voxel: &Point3<f32>) -> bool {
        if !self.options.empty_space_skipping {
            return false;
        }
        self.empty_space.map_or(false, |map| map.is_empty(voxel))
    }

    fn composite(&self, voxel: Point3<f32>, state: &mut MarchState) {
        let (sample, shade) = match self.options.shading {
            Some(shading) => {
                let (sample, gradient) = self.volume.sample_at_gradient(voxel);
                (sample, self.lambert(&gradient, &shading))
            }
            None => (self.volume.sample_at(voxel), 1.0),
        };

        let color = self.tf.evaluate(sample);
        let alpha = color.w.clamp(0.0, 1.0);
        if alpha == 0.0 {
            return;
        }

        let weight = (1.0 - state.accum.w) * alpha;
        let rgb = color.xyz() * shade;
        state.accum.x += weight * rgb.x;
        state.accum.y += weight * rgb.y;
        state.accum.z += weight * rgb.z;
        state.accum.w += weight;
    }

    /// Gradient in voxel units to world normal, then diffuse term
    fn lambert(&self, gradient: &Vector3<f32>, shading: &Shading) -> f32 {
        let local = gradient.component_div(&self.spacing);
        let world = self.bbox.orientation * local;
        let magnitude = world.magnitude();
        if !magnitude.is_finite() || magnitude < FLAT_GRADIENT {
            return 1.0;
        }

        // normal points out of dense regions
        let normal = -world / magnitude;
        let n_dot_l = f32::max(normal.dot(&shading.light_dir.normalize()), 0.0);
        shading.ambient + (1.0 - shading.ambient) * n_dot_l
    }

    fn finish(&self, state: &mut MarchState) {
        if self.options.mode == RaymarchMode::MaximumIntensity {
            if let Some(max) = state.max_sample {
                let color = self.tf.evaluate(max);
                let alpha = color.w.clamp(0.0, 1.0);
                state.accum = vector![color.x * alpha, color.y * alpha, color.z * alpha, alpha];
            }
        }
        state.phase = MarchPhase::Terminated;
    }
}
