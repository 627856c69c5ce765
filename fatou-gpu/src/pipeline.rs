//! Render pipelines for stencil masks, blits and compositing.

use std::collections::HashMap;

use fatou_core::WriteMask;

/// Color format of every scheduler target.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Attachment format holding the interlace mask.
pub const STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// How a render pass treats the stencil. Pipelines drawn inside the pass
/// have to be built for the same variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassVariant {
    /// Target without stencil attachment.
    Plain,
    /// Stencil attached, test off.
    Unmasked,
    /// Stencil attached, only pixels equal to the pass reference pass.
    Masked,
}

impl PassVariant {
    pub fn new(has_stencil: bool, mask: WriteMask) -> Self {
        match (has_stencil, mask) {
            (false, _) => PassVariant::Plain,
            (true, WriteMask::All) => PassVariant::Unmasked,
            (true, _) => PassVariant::Masked,
        }
    }

    /// Depth-stencil state for pipelines drawn in this kind of pass.
    pub fn depth_stencil(self) -> Option<wgpu::DepthStencilState> {
        let compare = match self {
            PassVariant::Plain => return None,
            PassVariant::Unmasked => wgpu::CompareFunction::Always,
            PassVariant::Masked => wgpu::CompareFunction::Equal,
        };
        Some(stencil_state(compare, wgpu::StencilOperation::Keep, 0))
    }
}

fn stencil_state(
    compare: wgpu::CompareFunction,
    pass_op: wgpu::StencilOperation,
    write_mask: u32,
) -> wgpu::DepthStencilState {
    let face = wgpu::StencilFaceState {
        compare,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op,
    };
    wgpu::DepthStencilState {
        format: STENCIL_FORMAT,
        depth_write_enabled: false,
        depth_compare: wgpu::CompareFunction::Always,
        stencil: wgpu::StencilState {
            front: face,
            back: face,
            read_mask: 0xff,
            write_mask,
        },
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Full-target quad pipeline: four-vertex strip, no culling, no blending.
#[allow(clippy::too_many_arguments)]
pub fn quad_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
    write_mask: wgpu::ColorWrites,
    depth_stencil: Option<wgpu::DepthStencilState>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[],
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            ..Default::default()
        },
        depth_stencil,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some(fragment_entry),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask,
            })],
        }),
        multiview: None,
        cache: None,
    })
}

/// Pipelines owned by the backend.
pub struct Pipelines {
    pub blit_layout: wgpu::BindGroupLayout,
    blit_pipeline_layout: wgpu::PipelineLayout,
    blit_module: wgpu::ShaderModule,
    blit: HashMap<PassVariant, wgpu::RenderPipeline>,
    composite: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    mask_columns: wgpu::RenderPipeline,
    mask_rows: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(device: &wgpu::Device) -> Self {
        let blit_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });
        let mask_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mask"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mask.wgsl").into()),
        });

        let blit_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blit"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });
        let blit_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blit"),
            bind_group_layouts: &[&blit_layout],
            push_constant_ranges: &[],
        });

        let blit = [
            PassVariant::Plain,
            PassVariant::Unmasked,
            PassVariant::Masked,
        ]
        .into_iter()
        .map(|variant| {
            let pipeline = quad_pipeline(
                device,
                "blit",
                &blit_pipeline_layout,
                &blit_module,
                "fs_main",
                TARGET_FORMAT,
                wgpu::ColorWrites::ALL,
                variant.depth_stencil(),
            );
            (variant, pipeline)
        })
        .collect();

        let mask_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mask"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });
        let mask = |entry: &str| {
            quad_pipeline(
                device,
                "mask",
                &mask_layout,
                &mask_module,
                entry,
                TARGET_FORMAT,
                wgpu::ColorWrites::empty(),
                Some(stencil_state(
                    wgpu::CompareFunction::Always,
                    wgpu::StencilOperation::Replace,
                    0xff,
                )),
            )
        };

        Self {
            mask_columns: mask("fs_columns"),
            mask_rows: mask("fs_rows"),
            blit_layout,
            blit_pipeline_layout,
            blit_module,
            blit,
            composite: HashMap::new(),
        }
    }

    /// Blit pipeline for a scheduler target.
    pub fn blit(&self, variant: PassVariant) -> &wgpu::RenderPipeline {
        &self.blit[&variant]
    }

    /// Stencil-writing pipeline for column (`vertical`) or row masks.
    pub fn mask(&self, vertical: bool) -> &wgpu::RenderPipeline {
        if vertical {
            &self.mask_columns
        } else {
            &self.mask_rows
        }
    }

    /// Blit pipeline for the output surface, built on first use per format.
    pub fn composite(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
    ) -> &wgpu::RenderPipeline {
        let (layout, module) = (&self.blit_pipeline_layout, &self.blit_module);
        self.composite.entry(format).or_insert_with(|| {
            log::debug!("building composite pipeline for {format:?}");
            quad_pipeline(
                device,
                "composite",
                layout,
                module,
                "fs_main",
                format,
                wgpu::ColorWrites::ALL,
                None,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_follows_stencil_and_mask() {
        assert_eq!(PassVariant::new(false, WriteMask::Front), PassVariant::Plain);
        assert_eq!(PassVariant::new(true, WriteMask::All), PassVariant::Unmasked);
        assert_eq!(PassVariant::new(true, WriteMask::Back), PassVariant::Masked);
    }

    #[test]
    fn masked_variant_compares_equal_without_writing() {
        assert!(PassVariant::Plain.depth_stencil().is_none());
        let state = PassVariant::Masked.depth_stencil().unwrap();
        assert_eq!(state.format, STENCIL_FORMAT);
        assert_eq!(state.stencil.front.compare, wgpu::CompareFunction::Equal);
        assert_eq!(state.stencil.write_mask, 0);

        let state = PassVariant::Unmasked.depth_stencil().unwrap();
        assert_eq!(state.stencil.back.compare, wgpu::CompareFunction::Always);
    }
}
