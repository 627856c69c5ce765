//! Diagnostic sampler drawing flat colors or a coordinate grid.

use std::collections::HashMap;

use fatou_core::{Complex, Rect, RenderResult, Sampler, Size};

use crate::backend::{GpuBackend, GpuPass};
use crate::buffers::PatternUniforms;
use crate::pipeline::{quad_pipeline, PassVariant};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pattern {
    Solid([f32; 4]),
    /// Checkerboard of 1/8 fractal units, tinted by the color.
    Grid([f32; 4]),
}

/// Pipelines are built lazily for each pass variant and format the
/// sampler meets.
pub struct TestPatternSampler {
    pattern: Pattern,
    resources: Option<Resources>,
    pipelines: HashMap<(PassVariant, wgpu::TextureFormat), wgpu::RenderPipeline>,
}

struct Resources {
    module: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl Resources {
    fn new(device: &wgpu::Device) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("test_pattern"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/test_pattern.wgsl").into()),
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("test_pattern"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("test_pattern"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("test_pattern_uniforms"),
            size: std::mem::size_of::<PatternUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("test_pattern"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });
        Self {
            module,
            layout,
            uniforms,
            bind_group,
        }
    }
}

impl TestPatternSampler {
    pub fn new(pattern: Pattern) -> Self {
        Self {
            pattern,
            resources: None,
            pipelines: HashMap::new(),
        }
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    pub fn set_pattern(&mut self, pattern: Pattern) {
        self.pattern = pattern;
    }
}

impl Default for TestPatternSampler {
    fn default() -> Self {
        Self::new(Pattern::Grid([1.0; 4]))
    }
}

impl Sampler<GpuBackend> for TestPatternSampler {
    fn render(
        &mut self,
        pass: &mut GpuPass<'_>,
        _region: Rect,
        position: Complex,
        zoom: Complex,
        pixel_size: Size,
    ) -> RenderResult<()> {
        let resources = self
            .resources
            .get_or_insert_with(|| Resources::new(pass.device()));
        let key = (pass.variant(), pass.format());
        let pipeline = self.pipelines.entry(key).or_insert_with(|| {
            quad_pipeline(
                pass.device(),
                "test_pattern",
                &resources.layout,
                &resources.module,
                "fs_main",
                key.1,
                wgpu::ColorWrites::ALL,
                key.0.depth_stencil(),
            )
        });

        let (mode, color) = match self.pattern {
            Pattern::Solid(color) => (0, color),
            Pattern::Grid(color) => (1, color),
        };
        let uniforms = PatternUniforms::new(position, zoom, pixel_size, mode, color);
        pass.queue()
            .write_buffer(&resources.uniforms, 0, bytemuck::bytes_of(&uniforms));

        let render_pass = pass.render_pass();
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &resources.bind_group, &[]);
        render_pass.draw(0..4, 0..1);
        Ok(())
    }

    fn set_parameters(&mut self, params: &[(&'static str, f64)]) {
        log::trace!("test pattern ignores {} parameters", params.len());
    }
}
