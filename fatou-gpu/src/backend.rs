//! [`RenderBackend`] on top of wgpu.
//!
//! Every operation records into its own encoder and submits right away, so
//! uniform writes issued by a sampler are ordered with the pass that reads
//! them.

use fatou_core::{
    IdAllocator, Rect, RenderBackend, RenderError, RenderResult, SampleRequest, Sampler, Size,
    TargetKind, WriteBinding,
};
use wgpu::util::DeviceExt;

use crate::buffers::BlitUniforms;
use crate::device::GpuContext;
use crate::error::{scoped, GpuError};
use crate::pipeline::{PassVariant, Pipelines};
use crate::target::GpuTarget;

/// What a sampler draws with: an open render pass scissored to the
/// requested region, with the stencil reference of the write already set.
pub struct GpuPass<'a> {
    render_pass: wgpu::RenderPass<'a>,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    variant: PassVariant,
    format: wgpu::TextureFormat,
}

impl<'a> GpuPass<'a> {
    pub fn render_pass(&mut self) -> &mut wgpu::RenderPass<'a> {
        &mut self.render_pass
    }

    pub fn device(&self) -> &wgpu::Device {
        self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        self.queue
    }

    /// Stencil variant pipelines drawn in this pass must be built for.
    pub fn variant(&self) -> PassVariant {
        self.variant
    }

    /// Color format of the target being written.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

/// Destination of [`RenderBackend::composite`], usually a surface texture.
struct Output {
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
}

pub struct GpuBackend {
    context: GpuContext,
    pipelines: Pipelines,
    nearest: wgpu::Sampler,
    linear: wgpu::Sampler,
    ids: IdAllocator,
    output: Option<Output>,
}

impl GpuBackend {
    pub fn new(context: GpuContext) -> Result<Self, GpuError> {
        let device = &context.device;
        let pipelines = scoped(device, "Pipelines::new", || Pipelines::new(device))?;
        let filter_sampler = |label: &str, filter: wgpu::FilterMode| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter,
                min_filter: filter,
                ..Default::default()
            })
        };
        let nearest = filter_sampler("nearest", wgpu::FilterMode::Nearest);
        let linear = filter_sampler("linear", wgpu::FilterMode::Linear);

        Ok(Self {
            context,
            pipelines,
            nearest,
            linear,
            ids: IdAllocator::new(),
            output: None,
        })
    }

    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    /// Where [`RenderBackend::composite`] draws. Set it again whenever the
    /// surface hands out a new frame.
    pub fn set_output(&mut self, view: wgpu::TextureView, format: wgpu::TextureFormat) {
        self.output = Some(Output { view, format });
    }

    pub fn clear_output(&mut self) {
        self.output = None;
    }

    fn check_size(&self, size: Size) -> RenderResult<()> {
        if size.is_empty() {
            return Err(RenderError::InvalidSize(size));
        }
        let max = self.context.max_texture_dimension;
        if size.w > max || size.h > max {
            return Err(RenderError::resource(
                "GpuBackend::create_target",
                format!("{size} exceeds the texture limit of {max}"),
            ));
        }
        Ok(())
    }

    fn blit_bind_group(&self, src: &GpuTarget, tex_coords: Rect) -> wgpu::BindGroup {
        let device = &self.context.device;
        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("blit_uniforms"),
            contents: bytemuck::bytes_of(&BlitUniforms::new(tex_coords)),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let sampler = if src.is_linear() {
            &self.linear
        } else {
            &self.nearest
        };
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blit"),
            layout: &self.pipelines.blit_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(src.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniforms.as_entire_binding(),
                },
            ],
        })
    }

    fn submit(&self, encoder: wgpu::CommandEncoder) {
        self.context.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl RenderBackend for GpuBackend {
    type Target = GpuTarget;
    type Pass<'a> = GpuPass<'a>;

    fn supports_stencil(&self) -> bool {
        self.context.stencil_supported
    }

    fn create_target(&mut self, size: Size, kind: TargetKind) -> RenderResult<GpuTarget> {
        self.check_size(size)?;
        let label = match kind {
            TargetKind::Plain => self.ids.label("downsample"),
            TargetKind::Interlaced { .. } => self.ids.label("level"),
        };
        log::debug!("creating {label} {size}");

        let GpuContext { device, queue, .. } = &self.context;
        let pipelines = &self.pipelines;
        let target = scoped(device, "InterlacedTarget::new", || {
            let target = GpuTarget::new(device, label, size, kind);
            target.write_mask(device, queue, pipelines);
            target
        })?;
        Ok(target)
    }

    fn destroy_target(&mut self, target: GpuTarget) {
        log::trace!("destroying {}", target.label());
        target.destroy();
    }

    fn set_linear(&mut self, target: &GpuTarget, linear: bool) {
        target.set_linear(linear);
    }

    fn sample<S: Sampler<Self> + ?Sized>(
        &mut self,
        target: &GpuTarget,
        binding: &WriteBinding,
        request: &SampleRequest,
        sampler: &mut S,
    ) -> RenderResult<()> {
        let scissor = request.region.to_pixels(target.size());
        if scissor.is_empty() {
            return Ok(());
        }

        let GpuContext { device, queue, .. } = &self.context;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("sample_encoder"),
        });
        {
            let mut render_pass = target.begin_pass(&mut encoder, "sample", None);
            render_pass.set_scissor_rect(scissor.x, scissor.y, scissor.width, scissor.height);
            if let Some(reference) = binding.mask().stencil_reference() {
                render_pass.set_stencil_reference(reference);
            }
            let mut pass = GpuPass {
                render_pass,
                device,
                queue,
                variant: PassVariant::new(target.has_stencil(), binding.mask()),
                format: crate::pipeline::TARGET_FORMAT,
            };
            sampler.render(
                &mut pass,
                request.region,
                request.position,
                request.zoom,
                request.pixel_size,
            )?;
        }
        self.submit(encoder);
        Ok(())
    }

    fn blit(
        &mut self,
        src: &GpuTarget,
        dst: &GpuTarget,
        binding: &WriteBinding,
        tex_coords: Rect,
    ) -> RenderResult<()> {
        if std::ptr::eq(src, dst) {
            return Err(RenderError::resource(
                "GpuBackend::blit",
                format!("{} cannot be read and written at once", src.label()),
            ));
        }
        let bind_group = self.blit_bind_group(src, tex_coords);
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("blit_encoder"),
                });
        {
            let mut pass = dst.begin_pass(&mut encoder, "blit", None);
            let variant = PassVariant::new(dst.has_stencil(), binding.mask());
            pass.set_pipeline(self.pipelines.blit(variant));
            if let Some(reference) = binding.mask().stencil_reference() {
                pass.set_stencil_reference(reference);
            }
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..4, 0..1);
        }
        self.submit(encoder);
        Ok(())
    }

    fn composite(&mut self, src: &GpuTarget) -> RenderResult<()> {
        let Some(output) = &self.output else {
            return Err(RenderError::resource(
                "GpuBackend::composite",
                "no output surface set",
            ));
        };
        let bind_group = self.blit_bind_group(src, Rect::FULL);
        let device = &self.context.device;
        let pipeline = self.pipelines.composite(device, output.format);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("composite_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("composite"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &output.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..4, 0..1);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn flush(&mut self) {
        self.context.device.poll(wgpu::Maintain::Poll);
    }
}
