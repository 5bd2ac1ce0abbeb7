//! # Orbis
//!
//! The world grid: a square of `cells_per_axis × cells_per_axis` cells of
//! [`Cell::SIZE`] world units, centred on the origin.
//!
//! ## Index Reuse
//!
//! A removed entity's slot is not reused until the next [`Orbis::update`].
//! The renderer and the effects worker hold ids for the duration of a frame,
//! so a slot must stay empty for a full cycle before it can be handed out
//! again; otherwise a stale id would silently resolve to a new entity.

use ozone_core::Vec3;

use crate::entity::{Frag, FragId, Object, ObjectId, Struct, StructId};
use crate::environment::{Caelum, Terra};

/// Fixed-size square of the world.
#[derive(Clone, Debug, Default)]
pub struct Cell {
    /// Structures whose bounds overlap this cell.
    pub structs: Vec<StructId>,
    /// Objects whose position lies in this cell.
    pub objects: Vec<ObjectId>,
    /// Fragments whose position lies in this cell.
    pub frags: Vec<FragId>,
}

impl Cell {
    /// Edge length in world units (integer).
    pub const SIZEI: i32 = 16;
    /// Edge length in world units.
    pub const SIZE: f32 = 16.0;
    /// `1 / SIZE`.
    pub const INV_SIZE: f32 = 1.0 / Self::SIZE;
    /// Radius of the circle enclosing a cell's footprint.
    pub const RADIUS: f32 = Self::SIZE / 2.0 * std::f32::consts::SQRT_2;

    /// True if the cell references nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.structs.is_empty() && self.objects.is_empty() && self.frags.is_empty()
    }
}

/// Inclusive rectangle of cell coordinates. Empty when `min > max` on an axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    /// First column.
    pub min_x: i32,
    /// First row.
    pub min_y: i32,
    /// Last column (inclusive).
    pub max_x: i32,
    /// Last row (inclusive).
    pub max_y: i32,
}

impl Span {
    /// Creates a span.
    #[must_use]
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// True if the span holds no cell.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// True if `(x, y)` lies inside the span.
    #[must_use]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        self.min_x <= x && x <= self.max_x && self.min_y <= y && y <= self.max_y
    }

    /// Number of cells in the span.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let w = usize::try_from(self.max_x - self.min_x + 1).unwrap_or(0);
        let h = usize::try_from(self.max_y - self.min_y + 1).unwrap_or(0);
        w * h
    }

    /// Clamps the span to a grid of `cells` cells per axis.
    #[must_use]
    pub fn clamped(self, cells: i32) -> Self {
        let last = cells - 1;
        Self::new(
            self.min_x.clamp(0, last),
            self.min_y.clamp(0, last),
            self.max_x.clamp(0, last),
            self.max_y.clamp(0, last),
        )
    }

    /// Cell coordinates in column-major order (x outer, y inner).
    pub fn cells(self) -> impl Iterator<Item = (i32, i32)> {
        (self.min_x..=self.max_x).flat_map(move |x| (self.min_y..=self.max_y).map(move |y| (x, y)))
    }
}

/// Pending and reusable slot indices of one entity kind.
#[derive(Clone, Debug, Default)]
struct SlotRecycler {
    /// Freed this cycle, not yet reusable.
    freeing: Vec<usize>,
    /// Freed at least one full cycle ago.
    available: Vec<usize>,
}

impl SlotRecycler {
    fn allocate<T>(&mut self, slots: &mut Vec<Option<T>>, value: T) -> usize {
        if let Some(index) = self.available.pop() {
            slots[index] = Some(value);
            index
        } else {
            slots.push(Some(value));
            slots.len() - 1
        }
    }

    fn release(&mut self, index: usize) {
        self.freeing.push(index);
    }

    fn commit(&mut self) {
        self.available.append(&mut self.freeing);
    }
}

/// The world: cell grid plus entity storage.
#[derive(Clone, Debug)]
pub struct Orbis {
    /// Cells per axis.
    cells_per_axis: i32,
    /// Half the grid's edge length in world units.
    dim: f32,
    /// Cells, `x * cells_per_axis + y`.
    cells: Vec<Cell>,
    /// Structure slots.
    structs: Vec<Option<Struct>>,
    /// Object slots.
    objects: Vec<Option<Object>>,
    /// Fragment slots.
    frags: Vec<Option<Frag>>,
    struct_slots: SlotRecycler,
    object_slots: SlotRecycler,
    frag_slots: SlotRecycler,
    /// Sky state.
    pub caelum: Caelum,
    /// Terrain state.
    pub terra: Terra,
}

impl Orbis {
    /// Default cells per axis: a 4096 × 4096 world.
    pub const CELLS: i32 = 4096 / Cell::SIZEI;
    /// Half-height of the world; every entity lies within `|z| <= DIM_Z`.
    pub const DIM_Z: f32 = 512.0;

    /// Creates an empty world of the default size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cells(Self::CELLS)
    }

    /// Creates an empty world of `cells_per_axis²` cells.
    ///
    /// # Panics
    ///
    /// Panics if `cells_per_axis < 1`.
    #[must_use]
    pub fn with_cells(cells_per_axis: i32) -> Self {
        assert!(cells_per_axis >= 1, "Orbis needs at least one cell");

        let count = usize::try_from(cells_per_axis * cells_per_axis).unwrap_or(1);
        #[allow(clippy::cast_precision_loss)]
        let dim = Cell::SIZE * cells_per_axis as f32 / 2.0;

        Self {
            cells_per_axis,
            dim,
            cells: vec![Cell::default(); count],
            structs: Vec::new(),
            objects: Vec::new(),
            frags: Vec::new(),
            struct_slots: SlotRecycler::default(),
            object_slots: SlotRecycler::default(),
            frag_slots: SlotRecycler::default(),
            caelum: Caelum::default(),
            terra: Terra::default(),
        }
    }

    /// Cells per axis.
    #[inline]
    #[must_use]
    pub const fn cells_per_axis(&self) -> i32 {
        self.cells_per_axis
    }

    /// Half the grid's edge length; the world spans `[-dim, dim)` on x and y.
    #[inline]
    #[must_use]
    pub const fn dim(&self) -> f32 {
        self.dim
    }

    /// The whole grid as a span.
    #[must_use]
    pub const fn full_span(&self) -> Span {
        Span::new(0, 0, self.cells_per_axis - 1, self.cells_per_axis - 1)
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn to_cell(&self, coord: f32) -> i32 {
        ((coord + self.dim) * Cell::INV_SIZE).floor() as i32
    }

    /// Cell coordinates holding world position `(x, y)`, clamped to the grid.
    #[must_use]
    pub fn cell_coords(&self, x: f32, y: f32) -> (i32, i32) {
        let last = self.cells_per_axis - 1;
        (self.to_cell(x).clamp(0, last), self.to_cell(y).clamp(0, last))
    }

    /// World-space centre of cell `(x, y)`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn cell_centre(&self, x: i32, y: i32) -> (f32, f32) {
        let half = Cell::SIZE / 2.0;
        (
            x as f32 * Cell::SIZE - self.dim + half,
            y as f32 * Cell::SIZE - self.dim + half,
        )
    }

    /// Cells a point with tolerance `epsilon` may touch.
    #[must_use]
    pub fn get_inters(&self, p: Vec3, epsilon: f32) -> Span {
        self.get_inters_area(p.x, p.y, p.x, p.y, epsilon)
    }

    /// Cells the rectangle `[min, max]` grown by `epsilon` intersects,
    /// clamped to the grid.
    #[must_use]
    pub fn get_inters_area(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32, epsilon: f32) -> Span {
        Span::new(
            self.to_cell(min_x - epsilon),
            self.to_cell(min_y - epsilon),
            self.to_cell(max_x + epsilon),
            self.to_cell(max_y + epsilon),
        )
        .clamped(self.cells_per_axis)
    }

    #[inline]
    fn cell_index(&self, x: i32, y: i32) -> usize {
        assert!(
            (0..self.cells_per_axis).contains(&x) && (0..self.cells_per_axis).contains(&y),
            "cell ({x}, {y}) outside {0}x{0} grid",
            self.cells_per_axis
        );
        usize::try_from(x * self.cells_per_axis + y).unwrap_or(0)
    }

    /// Cell `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates lie outside the grid. Spans returned by
    /// [`Orbis::get_inters`] are always inside.
    #[inline]
    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> &Cell {
        &self.cells[self.cell_index(x, y)]
    }

    fn cell_mut(&mut self, x: i32, y: i32) -> &mut Cell {
        let index = self.cell_index(x, y);
        &mut self.cells[index]
    }

    /// Cell holding world position `p`, clamped to the grid.
    #[must_use]
    pub fn get_cell(&self, p: Vec3) -> &Cell {
        let (x, y) = self.cell_coords(p.x, p.y);
        self.cell(x, y)
    }

    // ---------------------------------------------------------------------
    // Structures
    // ---------------------------------------------------------------------

    /// Number of structure slots, live or free. Structure ids are below this.
    #[inline]
    #[must_use]
    pub fn struct_slots(&self) -> usize {
        self.structs.len()
    }

    /// Structure by id.
    #[inline]
    #[must_use]
    pub fn struct_(&self, id: StructId) -> Option<&Struct> {
        self.structs.get(id.index()).and_then(Option::as_ref)
    }

    /// Live structures.
    pub fn structs(&self) -> impl Iterator<Item = (StructId, &Struct)> {
        self.structs.iter().enumerate().filter_map(|(i, s)| {
            let id = StructId(u16::try_from(i).ok()?);
            s.as_ref().map(|s| (id, s))
        })
    }

    /// Adds a structure and registers it in every cell its bounds overlap.
    ///
    /// Returns `None` when all `u16` ids are in use.
    pub fn add_struct(&mut self, str_: Struct) -> Option<StructId> {
        if self.struct_slots.available.is_empty() && self.structs.len() > usize::from(u16::MAX) {
            tracing::warn!("Orbis: structure slots exhausted");
            return None;
        }

        let span = self.get_inters_area(str_.mins.x, str_.mins.y, str_.maxs.x, str_.maxs.y, 0.0);
        let index = self.struct_slots.allocate(&mut self.structs, str_);
        let id = StructId(u16::try_from(index).ok()?);

        for (x, y) in span.cells() {
            self.cell_mut(x, y).structs.push(id);
        }
        Some(id)
    }

    /// Removes a structure from the world and all its cells.
    pub fn remove_struct(&mut self, id: StructId) -> Option<Struct> {
        let str_ = self.structs.get_mut(id.index())?.take()?;

        let span = self.get_inters_area(str_.mins.x, str_.mins.y, str_.maxs.x, str_.maxs.y, 0.0);
        for (x, y) in span.cells() {
            self.cell_mut(x, y).structs.retain(|&s| s != id);
        }
        self.struct_slots.release(id.index());
        Some(str_)
    }

    // ---------------------------------------------------------------------
    // Objects
    // ---------------------------------------------------------------------

    /// Object by id.
    #[inline]
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id.index()).and_then(Option::as_ref)
    }

    /// Mutable object by id. Moving it must go through [`Orbis::move_object`].
    #[must_use]
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Live objects.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.objects.iter().enumerate().filter_map(|(i, o)| {
            let id = ObjectId(u32::try_from(i).ok()?);
            o.as_ref().map(|o| (id, o))
        })
    }

    /// Adds an object to the cell holding its position.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_object(&mut self, obj: Object) -> ObjectId {
        let (x, y) = self.cell_coords(obj.p.x, obj.p.y);
        let index = self.object_slots.allocate(&mut self.objects, obj);
        let id = ObjectId(index as u32);

        self.cell_mut(x, y).objects.push(id);
        id
    }

    /// Moves an object, updating cell membership. Returns false for a dead id.
    pub fn move_object(&mut self, id: ObjectId, p: Vec3) -> bool {
        let Some(old) = self.object(id).map(|o| o.p) else {
            return false;
        };

        let from = self.cell_coords(old.x, old.y);
        let to = self.cell_coords(p.x, p.y);
        if from != to {
            self.cell_mut(from.0, from.1).objects.retain(|&o| o != id);
            self.cell_mut(to.0, to.1).objects.push(id);
        }
        if let Some(obj) = self.object_mut(id) {
            obj.p = p;
        }
        true
    }

    /// Removes an object.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<Object> {
        let obj = self.objects.get_mut(id.index())?.take()?;
        let (x, y) = self.cell_coords(obj.p.x, obj.p.y);
        self.cell_mut(x, y).objects.retain(|&o| o != id);
        self.object_slots.release(id.index());
        Some(obj)
    }

    // ---------------------------------------------------------------------
    // Fragments
    // ---------------------------------------------------------------------

    /// Fragment by id.
    #[inline]
    #[must_use]
    pub fn frag(&self, id: FragId) -> Option<&Frag> {
        self.frags.get(id.index()).and_then(Option::as_ref)
    }

    /// Adds a fragment to the cell holding its position.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_frag(&mut self, frag: Frag) -> FragId {
        let (x, y) = self.cell_coords(frag.p.x, frag.p.y);
        let index = self.frag_slots.allocate(&mut self.frags, frag);
        let id = FragId(index as u32);

        self.cell_mut(x, y).frags.push(id);
        id
    }

    /// Removes a fragment.
    pub fn remove_frag(&mut self, id: FragId) -> Option<Frag> {
        let frag = self.frags.get_mut(id.index())?.take()?;
        let (x, y) = self.cell_coords(frag.p.x, frag.p.y);
        self.cell_mut(x, y).frags.retain(|&f| f != id);
        self.frag_slots.release(id.index());
        Some(frag)
    }

    /// Starts a simulation tick: slots freed during the previous tick become
    /// reusable and last tick's object events are dropped.
    pub fn update(&mut self) {
        self.struct_slots.commit();
        self.object_slots.commit();
        self.frag_slots.commit();

        for obj in self.objects.iter_mut().flatten() {
            obj.clear_events();
        }
    }
}

impl Default for Orbis {
    fn default() -> Self {
        Self::new()
    }
}
