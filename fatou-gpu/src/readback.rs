//! Copy target contents back to the CPU, for screenshots and tests.

use crate::backend::GpuBackend;
use crate::error::GpuError;
use crate::target::GpuTarget;

const BYTES_PER_PIXEL: u32 = 4;

/// Row pitch of a texture-to-buffer copy.
fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

impl GpuBackend {
    /// Tightly packed RGBA8 rows of `target`, top row first.
    pub async fn read_target(&self, target: &GpuTarget) -> Result<Vec<u8>, GpuError> {
        let size = target.size();
        let padded = padded_bytes_per_row(size.w);
        let device = &self.context().device;

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback_staging"),
            size: padded as u64 * size.h as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback_encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: target.texture(),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(size.h),
                },
            },
            wgpu::Extent3d {
                width: size.w,
                height: size.h,
                depth_or_array_layers: 1,
            },
        );
        self.context()
            .queue
            .submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = futures_channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);

        rx.await
            .map_err(|_| GpuError::Unavailable("Readback channel closed".into()))?
            .map_err(GpuError::BufferMap)?;

        let row = (size.w * BYTES_PER_PIXEL) as usize;
        let pixels = {
            let data = slice.get_mapped_range();
            data.chunks(padded as usize)
                .flat_map(|chunk| chunk[..row].iter().copied())
                .collect()
        };
        staging.unmap();
        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
    }
}
