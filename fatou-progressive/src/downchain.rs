// fatou-progressive/src/downchain.rs

use fatou_core::{Rect, RenderBackend, RenderResult, Size, TargetKind, WriteBinding};

/// Sizes of the downsample targets between a supersampled `source` and the
/// output `target`: each step halves every dimension that is still more than
/// twice the target, until both are within 2x.
pub fn chain_sizes(source: Size, target: Size) -> Vec<Size> {
    let mut sizes = Vec::new();
    let mut size = source;
    loop {
        let mut next = size;
        if next.w > target.w.saturating_mul(2) {
            next.w /= 2;
        }
        if next.h > target.h.saturating_mul(2) {
            next.h /= 2;
        }
        if next == size || next.is_empty() {
            break;
        }
        sizes.push(next);
        size = next;
    }
    sizes
}

struct Slot<T> {
    target: T,
    size: Size,
}

/// Chain of linear-filtered plain targets that smoothly reduce a
/// supersampled level before it is composited.
pub struct Downchain<T> {
    slots: Vec<Slot<T>>,
}

impl<T> Default for Downchain<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> Downchain<T> {
    /// Rebuild the chain for a new source/output pair.
    pub fn set_size<B>(&mut self, backend: &mut B, source: Size, target: Size) -> RenderResult<()>
    where
        B: RenderBackend<Target = T>,
    {
        self.destroy(backend);
        for size in chain_sizes(source, target) {
            let target = match backend.create_target(size, TargetKind::Plain) {
                Ok(t) => t,
                Err(e) => {
                    self.destroy(backend);
                    return Err(e);
                }
            };
            backend.set_linear(&target, true);
            self.slots.push(Slot { target, size });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn sizes(&self) -> Vec<Size> {
        self.slots.iter().map(|s| s.size).collect()
    }

    /// Blit `source` through every chain slot smaller than it and return the
    /// last written target, or `source` when no slot applies. The caller is
    /// expected to have switched `source` to linear filtering.
    pub fn rebind<'a, B>(
        &'a self,
        backend: &mut B,
        source: &'a T,
        source_size: Size,
    ) -> RenderResult<&'a T>
    where
        B: RenderBackend<Target = T>,
    {
        let mut current = source;
        let mut current_area = source_size.area();
        let unmasked = WriteBinding::unmasked();
        for slot in &self.slots {
            if slot.size.area() >= current_area {
                continue;
            }
            backend.blit(current, &slot.target, &unmasked, Rect::FULL)?;
            backend.flush();
            current = &slot.target;
            current_area = slot.size.area();
        }
        Ok(current)
    }

    pub fn destroy<B>(&mut self, backend: &mut B)
    where
        B: RenderBackend<Target = T>,
    {
        for slot in self.slots.drain(..) {
            backend.destroy_target(slot.target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Op, RecordingBackend};
    use fatou_core::WriteMask;

    #[test]
    fn chain_halves_until_within_twice_target() {
        let sizes = chain_sizes(Size::new(3200, 2400), Size::new(800, 600));
        assert_eq!(sizes, vec![Size::new(1600, 1200)]);

        let sizes = chain_sizes(Size::new(6400, 4800), Size::new(800, 600));
        assert_eq!(sizes, vec![Size::new(3200, 2400), Size::new(1600, 1200)]);
    }

    #[test]
    fn chain_is_empty_when_source_is_close_enough() {
        assert!(chain_sizes(Size::new(1600, 1200), Size::new(800, 600)).is_empty());
        assert!(chain_sizes(Size::new(800, 600), Size::new(800, 600)).is_empty());
    }

    #[test]
    fn chain_halves_dimensions_independently() {
        let sizes = chain_sizes(Size::new(3200, 1000), Size::new(800, 600));
        assert_eq!(sizes, vec![Size::new(1600, 1000)]);
    }

    #[test]
    fn set_size_replaces_stale_targets() {
        let mut backend = RecordingBackend::new();
        let mut chain = Downchain::default();
        chain
            .set_size(&mut backend, Size::new(6400, 4800), Size::new(800, 600))
            .unwrap();
        assert_eq!(chain.len(), 2);
        chain
            .set_size(&mut backend, Size::new(3200, 2400), Size::new(800, 600))
            .unwrap();
        assert_eq!(chain.sizes(), vec![Size::new(1600, 1200)]);
        assert_eq!(backend.live_targets(), 1);
    }

    #[test]
    fn rebind_walks_the_chain_and_skips_large_slots() {
        let mut backend = RecordingBackend::new();
        let mut chain = Downchain::default();
        chain
            .set_size(&mut backend, Size::new(6400, 4800), Size::new(800, 600))
            .unwrap();
        let source = backend
            .create_target(Size::new(3200, 2400), TargetKind::Plain)
            .unwrap();
        backend.take_ops();

        let out = chain
            .rebind(&mut backend, &source, Size::new(3200, 2400))
            .unwrap();
        assert_ne!(out.id, source.id);
        assert_eq!(out.size, Size::new(1600, 1200));

        let blits: Vec<_> = backend
            .ops()
            .iter()
            .filter_map(|op| match op {
                Op::Blit { src, mask, .. } => Some((*src, *mask)),
                _ => None,
            })
            .collect();
        assert_eq!(blits, vec![(source.id, WriteMask::All)]);
    }

    #[test]
    fn rebind_without_slots_returns_source() {
        let mut backend = RecordingBackend::new();
        let chain = Downchain::default();
        let source = backend
            .create_target(Size::new(100, 100), TargetKind::Plain)
            .unwrap();
        let out = chain
            .rebind(&mut backend, &source, Size::new(100, 100))
            .unwrap();
        assert_eq!(out.id, source.id);
    }
}
