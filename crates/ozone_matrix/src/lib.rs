//! # OZONE Matrix
//!
//! The world model the render core reads from.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                        Orbis                          │
//! │                                                       │
//! │  structs: [Option<Struct>]   objects: [Option<Object>]│
//! │  frags:   [Option<Frag>]     caelum, terra            │
//! │                                                       │
//! │  cells[x][y] ──> { structs, objects, frags } (ids)    │
//! └──────────────────────────────────────────────────────┘
//!            │ get_inters(p, radius) -> Span
//!            ▼
//!   render scheduler / effects worker (read-only)
//! ```
//!
//! Entities live in slot vectors owned by [`Orbis`]; cells only hold ids.
//! A structure is registered in every cell its bounds overlap, objects and
//! fragments in the single cell containing their position.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod collider;
pub mod entity;
pub mod environment;
pub mod medium;
pub mod orbis;

pub use collider::{Collider, Hit, OrbisCollider};
pub use entity::{Frag, FragId, Object, ObjectEvent, ObjectId, Struct, StructId};
pub use environment::{Caelum, Terra};
pub use medium::Medium;
pub use orbis::{Cell, Orbis, Span};
