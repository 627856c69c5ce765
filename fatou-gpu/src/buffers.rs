//! Uniform layouts shared with the WGSL shaders.

use bytemuck::{Pod, Zeroable};
use fatou_core::{Complex, Rect, Size};

/// Uniforms of `blit.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BlitUniforms {
    pub tex_coords: [f32; 4],
}

impl BlitUniforms {
    pub fn new(tex_coords: Rect) -> Self {
        Self {
            tex_coords: [
                tex_coords.l as f32,
                tex_coords.t as f32,
                tex_coords.r as f32,
                tex_coords.b as f32,
            ],
        }
    }
}

/// Uniforms of `test_pattern.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PatternUniforms {
    pub position: [f32; 2],
    pub zoom: [f32; 2],
    pub pixel_size: [f32; 2],
    /// 0 = solid color, 1 = coordinate grid.
    pub mode: u32,
    pub _pad: u32,
    pub color: [f32; 4],
}

impl PatternUniforms {
    pub fn new(position: Complex, zoom: Complex, pixel_size: Size, mode: u32, color: [f32; 4]) -> Self {
        Self {
            position: [position.re as f32, position.im as f32],
            zoom: [zoom.re as f32, zoom.im as f32],
            pixel_size: [pixel_size.w as f32, pixel_size.h as f32],
            mode,
            _pad: 0,
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<BlitUniforms>(), 16);
        // vec4 color starts at offset 32
        assert_eq!(std::mem::size_of::<PatternUniforms>(), 48);
    }

    #[test]
    fn blit_uniforms_keep_rect_order() {
        let u = BlitUniforms::new(Rect::new(0.125, 0.0, 1.125, 1.0));
        assert_eq!(u.tex_coords, [0.125, 0.0, 1.125, 1.0]);
    }
}
