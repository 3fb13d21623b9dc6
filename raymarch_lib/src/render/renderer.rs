use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    camera::RaySource,
    color::{self, RGBA},
    texture::{VolumeSlot, VolumeTexture},
    transfer_function::TransferFunction,
};

use super::{EmptySpaceMap, RaymarchMode, RenderOptions, Raymarcher};

/// Renders the currently published volume.
///
/// Every pixel is an independent ray, frame takes one snapshot of the volume slot,
/// so a volume published mid-frame shows up in the next frame.
pub struct Renderer<T>
where
    T: TransferFunction,
{
    slot: Arc<VolumeSlot<VolumeTexture>>,
    tf: T,
    render_options: RenderOptions,
}

impl<T> Renderer<T>
where
    T: TransferFunction,
{
    pub fn new(
        slot: Arc<VolumeSlot<VolumeTexture>>,
        tf: T,
        render_options: RenderOptions,
    ) -> Renderer<T> {
        Renderer {
            slot,
            tf,
            render_options,
        }
    }

    /// Renderer with its own slot, holding `volume`
    pub fn from_volume(volume: VolumeTexture, tf: T, render_options: RenderOptions) -> Renderer<T> {
        let slot = VolumeSlot::new();
        slot.publish(volume);
        Renderer::new(Arc::new(slot), tf, render_options)
    }

    pub fn slot(&self) -> &Arc<VolumeSlot<VolumeTexture>> {
        &self.slot
    }

    pub fn render_options(&self) -> &RenderOptions {
        &self.render_options
    }

    pub fn set_render_options(&mut self, opts: RenderOptions) {
        self.render_options = opts;
    }

    pub fn set_render_resolution(&mut self, res: (usize, usize)) {
        self.render_options.resolution = res;
    }

    pub fn set_transfer_function(&mut self, tf: T) {
        self.tf = tf;
    }

    /// Render into RGBA8 buffer, colors premultiplied by opacity.
    /// Buffer y=0 is up.
    ///
    /// # Panics
    ///
    /// If buffer length is not `4 * width * height`
    pub fn render_to_buffer<C>(&self, camera: &C, buffer: &mut [u8])
    where
        C: RaySource + ?Sized,
    {
        self.render_rows(camera, buffer, 4, |color, pixel| {
            pixel[0] = color::to_byte(color.x);
            pixel[1] = color::to_byte(color.y);
            pixel[2] = color::to_byte(color.z);
            pixel[3] = color::to_byte(color.w);
        });
    }

    /// Render into float buffer, one premultiplied color per pixel
    ///
    /// # Panics
    ///
    /// If buffer length is not `width * height`
    pub fn render_to_float_buffer<C>(&self, camera: &C, buffer: &mut [RGBA])
    where
        C: RaySource + ?Sized,
    {
        self.render_rows(camera, buffer, 1, |color, pixel| pixel[0] = *color);
    }

    /// Render new frame of premultiplied colors
    pub fn render_frame<C>(&self, camera: &C) -> Vec<RGBA>
    where
        C: RaySource + ?Sized,
    {
        let mut frame = vec![color::zero(); self.render_options.pixel_count()];
        self.render_to_float_buffer(camera, &mut frame);
        frame
    }

    fn render_rows<C, P, F>(&self, camera: &C, buffer: &mut [P], channels: usize, put: F)
    where
        C: RaySource + ?Sized,
        P: Send,
        F: Fn(&RGBA, &mut [P]) + Sync,
    {
        let (width, height) = self.render_options.resolution;
        assert_eq!(buffer.len(), width * height * channels, "frame buffer size");
        if width == 0 || height == 0 {
            return;
        }

        // Snapshot, frame is rendered from one volume even if a new one gets published
        let volume = self.slot.current();
        let march = self.render_options.march;
        // transparency of blocks depends on the transfer function, rebuilt every frame
        let empty_space = volume
            .as_ref()
            .filter(|_| march.empty_space_skipping && march.mode == RaymarchMode::Composite)
            .map(|v| EmptySpaceMap::new(v.range_index(), &self.tf));
        let marcher = volume.as_ref().map(|v| {
            let marcher =
                Raymarcher::new(&v.texture, v.bounding_box(), v.spacing(), &self.tf, march);
            match &empty_space {
                Some(map) => marcher.with_empty_space(map),
                None => marcher,
            }
        });

        let (step_x, step_y) = (1.0 / width as f32, 1.0 / height as f32);

        let render_row = |(y, row): (usize, &mut [P])| {
            let y_norm = (y as f32 + 0.5) * step_y;
            for x in 0..width {
                let color = match &marcher {
                    Some(marcher) => {
                        let pixel_coord = ((x as f32 + 0.5) * step_x, y_norm);
                        let ray = camera.get_ray(pixel_coord);
                        marcher.march(&ray)
                    }
                    None => color::zero(),
                };
                put(&color, &mut row[x * channels..(x + 1) * channels]);
            }
        };

        let row_len = width * channels;
        if self.render_options.multi_thread {
            buffer.par_chunks_mut(row_len).enumerate().for_each(render_row);
        } else {
            buffer.chunks_mut(row_len).enumerate().for_each(render_row);
        }
    }
}
