//! Whole build: encoded slices -> decoded slices -> packed volume -> texture -> publication.

mod build_front;

use std::sync::Arc;

use log::{debug, info, warn};
use nalgebra::Isometry3;
use rayon::prelude::*;

use crate::{
    common::CancelToken,
    error::{AssemblyError, BuildError, SliceError},
    slice::{EncodedSlice, Slice, SliceDecoder},
    texture::{
        MemoryTexture, TextureDestination, TextureFormat, UploadOptions, VolumeSlot,
        VolumeTexture, VolumeTextureWriter,
    },
    volumetric::{AssemblyOptions, PackedVolume, VolumeAssembler},
};

pub use build_front::{BuildFront, BuildMessage, BuildResult};

/// Outcome of a successful rebuild
#[derive(Debug)]
pub struct BuildReport {
    /// Generation of the published texture
    pub generation: u64,
    pub format: TextureFormat,
    /// Indices of slices dropped because they failed to decode
    pub skipped: Vec<i32>,
    /// Packed volume, only if the pipeline retains volumes
    pub volume: Option<PackedVolume>,
}

/// Outcome of an upload into a host destination
#[derive(Debug)]
pub struct UploadReport {
    pub format: TextureFormat,
    /// Indices of slices dropped because they failed to decode
    pub skipped: Vec<i32>,
    pub volume: PackedVolume,
}

/// Builds volume textures from slice stacks and publishes them.
///
/// Failed builds never touch the published texture. A build cancelled before
/// its publication never publishes.
#[derive(Debug, Clone)]
pub struct VolumePipeline {
    decoder: SliceDecoder,
    assembly: AssemblyOptions,
    upload: UploadOptions,
    transform: Isometry3<f32>,
    retain_volume: bool,
    slot: Arc<VolumeSlot<VolumeTexture>>,
}

impl VolumePipeline {
    pub fn new(decoder: SliceDecoder) -> VolumePipeline {
        VolumePipeline {
            decoder,
            assembly: AssemblyOptions::default(),
            upload: UploadOptions::default(),
            transform: Isometry3::identity(),
            retain_volume: false,
            slot: Arc::new(VolumeSlot::new()),
        }
    }

    pub fn with_assembly_options(mut self, options: AssemblyOptions) -> VolumePipeline {
        self.assembly = options;
        self
    }

    pub fn with_upload_options(mut self, options: UploadOptions) -> VolumePipeline {
        self.upload = options;
        self
    }

    /// World placement of published volumes
    pub fn with_transform(mut self, transform: Isometry3<f32>) -> VolumePipeline {
        self.transform = transform;
        self
    }

    /// Publish into a slot shared with renderers
    pub fn with_slot(mut self, slot: Arc<VolumeSlot<VolumeTexture>>) -> VolumePipeline {
        self.slot = slot;
        self
    }

    /// Keep the packed volume on CPU and hand it out in [`BuildReport`]
    pub fn retain_volume(mut self, retain: bool) -> VolumePipeline {
        self.retain_volume = retain;
        self
    }

    pub fn slot(&self) -> &Arc<VolumeSlot<VolumeTexture>> {
        &self.slot
    }

    pub fn decoder(&self) -> &SliceDecoder {
        &self.decoder
    }

    pub fn assembly_options(&self) -> &AssemblyOptions {
        &self.assembly
    }

    pub fn upload_options(&self) -> &UploadOptions {
        &self.upload
    }

    /// Decode slices in parallel and assemble them.
    ///
    /// In gap tolerant mode undecodable slices are skipped and become gaps,
    /// their indices are returned along with the volume.
    /// Unknown format tags always fail the build.
    pub fn build_packed(
        &self,
        encoded: Vec<EncodedSlice>,
        cancel: Option<&CancelToken>,
    ) -> Result<(PackedVolume, Vec<i32>), BuildError> {
        let cancelled = || cancel.map_or(false, CancelToken::is_cancelled);

        debug!("Decoding {} slices", encoded.len());
        let decoded: Vec<(i32, Option<Result<Slice, SliceError>>)> = encoded
            .par_iter()
            .map(|e| {
                // cancelled build stops decoding, remaining slices are left out
                let slice = (!cancelled()).then(|| self.decoder.decode(e));
                (e.index, slice)
            })
            .collect();

        if cancelled() {
            return Err(AssemblyError::Cancelled.into());
        }

        let mut slices = Vec::with_capacity(decoded.len());
        let mut skipped = Vec::new();
        for (index, result) in decoded {
            match result {
                Some(Ok(slice)) => slices.push(slice),
                Some(Err(SliceError::Decode(err))) if self.assembly.gap_tolerant => {
                    warn!("Skipping slice {index}, decoding failed: {err}");
                    skipped.push(index);
                }
                Some(Err(source)) => return Err(BuildError::Slice { index, source }),
                None => return Err(AssemblyError::Cancelled.into()),
            }
        }

        let mut options = self.assembly.clone();
        if let Some(token) = cancel {
            options.cancel = Some(token.clone());
        }
        let volume = VolumeAssembler::new(options).assemble(slices)?;

        Ok((volume, skipped))
    }

    /// Build and upload into `dest`, which gets (re)allocated to fit the volume.
    ///
    /// Nothing is published, `dest` is owned by the caller.
    /// On error `dest` may be left reallocated.
    pub fn upload_into<D>(
        &self,
        encoded: Vec<EncodedSlice>,
        cancel: Option<&CancelToken>,
        dest: &mut D,
    ) -> Result<UploadReport, BuildError>
    where
        D: TextureDestination + ?Sized,
    {
        let (volume, skipped) = self.build_packed(encoded, cancel)?;

        let writer = VolumeTextureWriter::new(self.upload);
        writer.allocate(&volume, dest)?;
        let format = writer.upload(&volume, dest)?;

        if cancel.map_or(false, CancelToken::is_cancelled) {
            return Err(AssemblyError::Cancelled.into());
        }

        Ok(UploadReport {
            format,
            skipped,
            volume,
        })
    }

    /// Build, upload into a fresh texture and publish it
    pub fn rebuild(
        &self,
        encoded: Vec<EncodedSlice>,
        cancel: Option<&CancelToken>,
    ) -> Result<BuildReport, BuildError> {
        let mut texture = MemoryTexture::new();
        let UploadReport {
            format,
            skipped,
            volume,
        } = self.upload_into(encoded, cancel, &mut texture)?;

        let published =
            VolumeTexture::new(texture, *volume.metadata()).with_transform(self.transform);
        let generation = self
            .slot
            .publish_unless(published, || cancel.map_or(false, CancelToken::is_cancelled))
            .ok_or(AssemblyError::Cancelled)?;
        info!(
            "Published volume {:?} as generation {generation}",
            volume.dims()
        );

        Ok(BuildReport {
            generation,
            format,
            skipped,
            volume: self.retain_volume.then(|| volume),
        })
    }
}
