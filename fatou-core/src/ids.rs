//! Owned id allocator for labelling GPU objects.

/// Hands out increasing ids. Each owner (backend, engine) keeps its own
/// allocator, so ids are unique per owner and never shared process-wide.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh id, starting at 1.
    pub fn next_id(&mut self) -> u64 {
        self.next += 1;
        self.next
    }

    /// Fresh label of the form `prefix#id`.
    pub fn label(&mut self, prefix: &str) -> String {
        format!("{prefix}#{}", self.next_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_increasing_and_start_at_one() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
        assert_eq!(ids.label("level"), "level#3");
    }

    #[test]
    fn allocators_are_independent() {
        let mut a = IdAllocator::new();
        let mut b = IdAllocator::new();
        a.next_id();
        a.next_id();
        assert_eq!(b.next_id(), 1);
    }
}
