//! Textures backing scheduler targets.

use std::cell::Cell;

use fatou_core::{Size, TargetKind};

use crate::pipeline::{Pipelines, STENCIL_FORMAT, TARGET_FORMAT};

/// Stencil attachment of an interlaced target.
struct StencilMask {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// A color texture plus, for interlaced targets, the stencil splitting it
/// into front and back sets.
pub struct GpuTarget {
    label: String,
    size: Size,
    kind: TargetKind,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    stencil: Option<StencilMask>,
    linear: Cell<bool>,
}

impl GpuTarget {
    /// Allocate the textures. Interlaced targets still need
    /// [`GpuTarget::write_mask`] before masked writes work.
    pub(crate) fn new(device: &wgpu::Device, label: String, size: Size, kind: TargetKind) -> Self {
        let extent = wgpu::Extent3d {
            width: size.w,
            height: size.h,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&label),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let stencil = match kind {
            TargetKind::Plain => None,
            TargetKind::Interlaced { .. } => {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(&format!("{label}.stencil")),
                    size: extent,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: STENCIL_FORMAT,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                Some(StencilMask { texture, view })
            }
        };

        Self {
            label,
            size,
            kind,
            texture,
            view,
            stencil,
            linear: Cell::new(false),
        }
    }

    /// Fill the stencil: 1 on even columns (rows), 0 elsewhere.
    pub(crate) fn write_mask(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipelines: &Pipelines,
    ) {
        let TargetKind::Interlaced { vertical } = self.kind else {
            return;
        };
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("mask_encoder"),
        });
        {
            let mut pass = self.begin_pass(&mut encoder, "mask", Some(0));
            pass.set_pipeline(pipelines.mask(vertical));
            pass.set_stencil_reference(1);
            pass.draw(0..4, 0..1);
        }
        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Open a render pass on this target keeping its color contents.
    /// `clear_stencil` resets the stencil first; otherwise it is loaded.
    pub(crate) fn begin_pass<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        label: &str,
        clear_stencil: Option<u32>,
    ) -> wgpu::RenderPass<'e> {
        let depth_stencil_attachment =
            self.stencil
                .as_ref()
                .map(|stencil| wgpu::RenderPassDepthStencilAttachment {
                    view: &stencil.view,
                    // depth is unused but shares the attachment
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: match clear_stencil {
                            Some(value) => wgpu::LoadOp::Clear(value),
                            None => wgpu::LoadOp::Load,
                        },
                        store: wgpu::StoreOp::Store,
                    }),
                });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn has_stencil(&self) -> bool {
        self.stencil.is_some()
    }

    pub fn is_linear(&self) -> bool {
        self.linear.get()
    }

    pub(crate) fn set_linear(&self, linear: bool) {
        self.linear.set(linear);
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub(crate) fn destroy(self) {
        self.texture.destroy();
        if let Some(stencil) = self.stencil {
            stencil.texture.destroy();
        }
    }
}
