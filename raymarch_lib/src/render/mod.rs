mod empty_space;
mod raymarcher;
mod render_options;
mod renderer;
mod step_policy;

pub use empty_space::{EmptySpaceMap, OPACITY_RESOLUTION};
pub use raymarcher::{
    ClipPlane, MarchOptions, MarchPhase, MarchState, RaymarchMode, Raymarcher, Shading,
    TERMINATION_THRESHOLD,
};
pub use render_options::{RenderOptions, RenderOptionsBuilder};
pub use renderer::Renderer;
pub use step_policy::StepPolicy;
