//! Volume rendering by raymarching, and building of volume textures from slice stacks.
//!
//! Build side: [`slice`] decodes slice images, [`volumetric`] assembles them into a packed
//! volume, [`texture`] uploads it and publishes the result, [`pipeline`] ties it together.
//!
//! Render side: [`camera`] generates rays, [`render`] marches them through the published volume.

pub mod camera;
pub mod color;
pub mod common;
pub mod error;
pub mod pipeline;
pub mod premade;
pub mod render;
pub mod slice;
pub mod test_helpers;
pub mod texture;
pub mod transfer_function;
pub mod volumetric;

pub use camera::{PerspectiveCamera, RaySource};
pub use error::{AssemblyError, BuildError, ConfigError, DecodeError, SliceError, UploadError};
pub use pipeline::{BuildFront, BuildReport, UploadReport, VolumePipeline};
pub use render::{RenderOptions, Renderer};
pub use transfer_function::TransferFunction;
