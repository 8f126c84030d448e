//! Typed pick-target resolution from raw pick ids.

use crate::buffer::BufferId;

/// A typed pick target resolved from a raw pick id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTarget {
    /// No target (background click or no hover).
    None,
    /// One primitive of one instance of a buffer.
    Primitive {
        /// Buffer the primitive belongs to.
        buffer: BufferId,
        /// Instance index; 0 for buffers without instances.
        instance: usize,
        /// Pick id local to the buffer.
        pid: usize,
    },
}

impl PickTarget {
    /// Returns `true` if this target is `None`.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[derive(Debug, Clone, Copy)]
struct Range {
    buffer: BufferId,
    start: u32,
    primitives: u32,
    instances: u32,
}

/// Maps raw pick ids to typed [`PickTarget`] values.
///
/// Pick ids are contiguous:
/// - `0` → no hit
/// - each buffer owns `primitives * instances` consecutive ids, in the
///   order buffers were given; within a buffer ids run primitive-fastest.
#[derive(Debug, Clone, Default)]
pub struct PickMap {
    ranges: Vec<Range>,
}

impl PickMap {
    /// Create a map from `(buffer, primitive count, instance count)`
    /// entries. An instance count of 0 is treated as 1.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (BufferId, usize, usize)>) -> Self {
        let mut next = 1_u32;
        let ranges = entries
            .into_iter()
            .map(|(buffer, primitives, instances)| {
                let range = Range {
                    buffer,
                    start: next,
                    primitives: primitives as u32,
                    instances: instances.max(1) as u32,
                };
                next += range.primitives * range.instances;
                range
            })
            .collect();
        Self { ranges }
    }

    /// Resolve a raw pick id to a typed target.
    #[must_use]
    pub fn resolve(&self, raw_id: u32) -> PickTarget {
        if raw_id == 0 {
            return PickTarget::None;
        }
        for r in &self.ranges {
            let len = r.primitives * r.instances;
            if raw_id >= r.start && raw_id < r.start + len {
                let local = raw_id - r.start;
                return PickTarget::Primitive {
                    buffer: r.buffer,
                    instance: (local / r.primitives) as usize,
                    pid: (local % r.primitives) as usize,
                };
            }
        }
        PickTarget::None
    }

    /// Raw id of a primitive, the inverse of [`PickMap::resolve`].
    #[must_use]
    pub fn raw_id(&self, buffer: BufferId, instance: usize, pid: usize) -> Option<u32> {
        let r = self.ranges.iter().find(|r| r.buffer == buffer)?;
        let (instance, pid) = (instance as u32, pid as u32);
        (instance < r.instances && pid < r.primitives)
            .then(|| r.start + instance * r.primitives + pid)
    }
}
