//! Distance-keyed draw lists.

use ozone_matrix::{ObjectId, StructId};

use crate::gpu::{DrawSink, MeshPass};

/// What a draw entry refers to. Ids index the world's storage and are valid
/// for the current frame only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawRef {
    /// A structure.
    Struct(StructId),
    /// An object.
    Object(ObjectId),
}

/// A staged draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawEntry {
    /// Approximate distance from the eye.
    pub distance: f32,
    /// Entity to draw.
    pub target: DrawRef,
}

impl DrawEntry {
    /// Creates an entry.
    #[must_use]
    pub const fn new(distance: f32, target: DrawRef) -> Self {
        Self { distance, target }
    }

    /// Issues this entry's draw for `pass`.
    #[inline]
    pub fn issue(&self, sink: &mut dyn DrawSink, pass: MeshPass) {
        match self.target {
            DrawRef::Struct(id) => sink.draw_bsp(id, pass),
            DrawRef::Object(id) => sink.draw_imago(id, pass),
        }
    }
}

/// Growable list of entries, reused frame to frame.
#[derive(Clone, Debug, Default)]
pub struct DrawList {
    entries: Vec<DrawEntry>,
}

impl DrawList {
    /// Creates a list with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Appends an entry.
    #[inline]
    pub fn push(&mut self, distance: f32, target: DrawRef) {
        self.entries.push(DrawEntry::new(distance, target));
    }

    /// Sorts by ascending distance. Ties keep no particular order.
    pub fn sort(&mut self) {
        self.entries.sort_unstable_by(|a, b| a.distance.total_cmp(&b.distance));
    }

    /// Drops all entries, keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in list order.
    #[must_use]
    pub fn entries(&self) -> &[DrawEntry] {
        &self.entries
    }

    /// Entries in list order.
    pub fn iter(&self) -> std::slice::Iter<'_, DrawEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a DrawList {
    type Item = &'a DrawEntry;
    type IntoIter = std::slice::Iter<'a, DrawEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
