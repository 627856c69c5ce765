// fatou-progressive/src/pyramid.rs

//! The upchain: interlaced targets from full supersampled resolution down to
//! a small coarse level, each half the previous one in one dimension.

use fatou_core::{RenderBackend, RenderError, RenderResult, Size, TargetKind, WriteBinding};

/// One pyramid level: a target whose pixels are split by a stencil mask
/// into a front and a back set of alternating 1-pixel strips.
pub struct InterlacedLevel<T> {
    target: T,
    size: Size,
    vertical: bool,
}

impl<T> InterlacedLevel<T> {
    /// Allocate the target and its mask. Empty sizes are rejected before any
    /// GPU object is created.
    pub fn create<B>(backend: &mut B, size: Size, vertical: bool) -> RenderResult<Self>
    where
        B: RenderBackend<Target = T>,
    {
        if size.is_empty() {
            return Err(RenderError::InvalidSize(size));
        }
        let target = backend.create_target(size, TargetKind::Interlaced { vertical })?;
        Ok(Self {
            target,
            size,
            vertical,
        })
    }

    /// Restrict following draws to the front (`true`) or back set.
    pub fn start_write(&self, front: bool) -> WriteBinding {
        WriteBinding::interlaced(front)
    }

    /// Close a write opened by [`start_write`](Self::start_write).
    pub fn end_write(&self, binding: WriteBinding) {
        let _ = binding;
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Strips are columns when true, rows otherwise.
    pub fn is_vertical(&self) -> bool {
        self.vertical
    }

    pub fn area(&self) -> u64 {
        self.size.area()
    }

    pub fn destroy<B>(self, backend: &mut B)
    where
        B: RenderBackend<Target = T>,
    {
        backend.destroy_target(self.target);
    }
}

/// Sizes and strip orientation of every pyramid level, finest first.
///
/// The first level is `full`; a vertical level halves the width of the next
/// one, a horizontal level halves the height, alternating and starting
/// vertical. Levels are added while the current area exceeds
/// `min_level_area`, but at least one level is always produced.
pub fn level_layout(full: Size, min_level_area: u64) -> Vec<(Size, bool)> {
    let mut layout = Vec::new();
    let mut size = full;
    let mut vertical = true;
    loop {
        layout.push((size, vertical));
        if vertical {
            size.w /= 2;
        } else {
            size.h /= 2;
        }
        vertical = !vertical;
        if size.area() <= min_level_area || size.is_empty() {
            break;
        }
    }
    layout
}

/// Interlaced levels ordered finest (index 0) to coarsest.
pub struct Pyramid<T> {
    levels: Vec<InterlacedLevel<T>>,
}

impl<T> Pyramid<T> {
    /// Build all levels for a supersampled `full` size. On failure the levels
    /// created so far are released again.
    pub fn build<B>(backend: &mut B, full: Size, min_level_area: u64) -> RenderResult<Self>
    where
        B: RenderBackend<Target = T>,
    {
        if full.is_empty() {
            return Err(RenderError::InvalidSize(full));
        }
        if !backend.supports_stencil() {
            return Err(RenderError::MissingCapability(
                "stencil attachment for interlaced targets".into(),
            ));
        }

        let mut pyramid = Self { levels: Vec::new() };
        for (size, vertical) in level_layout(full, min_level_area) {
            match InterlacedLevel::create(backend, size, vertical) {
                Ok(level) => pyramid.levels.push(level),
                Err(e) => {
                    pyramid.destroy(backend);
                    return Err(e);
                }
            }
        }
        log::info!(
            "pyramid built: {} levels, {} .. {}",
            pyramid.len(),
            full,
            pyramid.levels.last().map(|l| l.size()).unwrap_or(full)
        );
        Ok(pyramid)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level(&self, index: usize) -> &InterlacedLevel<T> {
        &self.levels[index]
    }

    pub fn levels(&self) -> &[InterlacedLevel<T>] {
        &self.levels
    }

    pub fn destroy<B>(&mut self, backend: &mut B)
    where
        B: RenderBackend<Target = T>,
    {
        for level in self.levels.drain(..) {
            level.destroy(backend);
        }
    }
}

impl<T> Default for Pyramid<T> {
    fn default() -> Self {
        Self { levels: Vec::new() }
    }
}
