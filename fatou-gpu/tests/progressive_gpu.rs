//! Progressive rendering on a real device. Skips when no adapter is found.

use fatou_core::{EffortSettings, FractalKind, RenderSettings, Size};
use fatou_gpu::{GpuAvailability, GpuBackend, GpuContext, TestPatternSampler};
use fatou_progressive::{Engine, RenderLoop};

fn gpu_engine(output_size: Size, sps: f64) -> Option<Engine<GpuBackend, TestPatternSampler>> {
    let GpuAvailability::Available(ctx) = pollster::block_on(GpuContext::try_init()) else {
        println!("Skipping test: no GPU available");
        return None;
    };
    if !ctx.stencil_supported {
        println!("Skipping test: no stencil support");
        return None;
    }
    let backend = GpuBackend::new(ctx).unwrap();
    let settings = RenderSettings::default().with_effort(EffortSettings::fixed(sps));
    Some(
        Engine::new(
            backend,
            TestPatternSampler::default(),
            FractalKind::Test,
            output_size,
            settings,
        )
        .unwrap(),
    )
}

fn attach_output(engine: &mut Engine<GpuBackend, TestPatternSampler>, size: Size) -> wgpu::Texture {
    let texture = engine
        .backend()
        .context()
        .device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("output"),
            size: wgpu::Extent3d {
                width: size.w,
                height: size.h,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
    engine.backend_mut().set_output(
        texture.create_view(&wgpu::TextureViewDescriptor::default()),
        wgpu::TextureFormat::Rgba8Unorm,
    );
    texture
}

// ============================================================================
// Refinement across frames
// ============================================================================

#[test]
fn small_budget_refines_to_a_complete_image() {
    let output_size = Size::new(64, 48);
    let Some(mut engine) = gpu_engine(output_size, 5000.0) else {
        return;
    };
    let _output = attach_output(&mut engine, output_size);
    let mut render_loop = RenderLoop::new();
    engine.attach(render_loop.push_handle());

    let mut t = 0.0;
    let mut saw_live = false;
    while engine.progress_percent() < 100.0 {
        render_loop.frame(t, &mut engine).unwrap();
        saw_live |= engine.stats().live;
        t += 40.0;
        assert!(t < 40.0 * 1000.0, "did not converge");
    }
    assert!(saw_live);
    assert_eq!(engine.effective_spp(), 16.0);

    let finest = engine.scheduler().pyramid().level(0);
    let data = pollster::block_on(engine.backend().read_target(finest.target())).unwrap();
    assert!(data.chunks(4).all(|p| p[3] == 255));

    let done = render_loop.terminate();
    render_loop.frame(t, &mut engine).unwrap();
    assert_eq!(pollster::block_on(done), Ok(()));
    engine.destroy();
}

#[test]
fn view_change_restarts_and_recovers() {
    let output_size = Size::new(32, 32);
    let Some(mut engine) = gpu_engine(output_size, 1e9) else {
        return;
    };
    let _output = attach_output(&mut engine, output_size);

    assert!(engine.tick(0.016, true).unwrap());
    assert_eq!(engine.progress_percent(), 100.0);

    let mut view = *engine.view();
    view.zoom *= 0.5;
    engine.on_view_changed(view);
    assert_eq!(engine.progress_percent(), 0.0);
    assert!(engine.tick(0.016, false).unwrap());
    assert_eq!(engine.progress_percent(), 100.0);
    engine.destroy();
}
