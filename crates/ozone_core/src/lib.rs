//! # OZONE Core
//!
//! Foundation types shared by the world model (`ozone_matrix`) and the
//! render core (`ozone_render`):
//!
//! - [`Vec3`]: the one vector type used for points, directions and extents
//! - [`approx`]: fast approximate square roots the culling thresholds are tuned against
//! - [`Bitset`]: fixed-length bit mask, used as the per-frame visited-structure mask
//!
//! ## Example
//!
//! ```rust
//! use ozone_core::{Bitset, Vec3};
//!
//! let d = Vec3::new(3.0, 4.0, 0.0);
//! assert!((d.fast_length() - 5.0).abs() < 0.05);
//!
//! let mut mask = Bitset::new(64);
//! assert!(!mask.test_and_set(7));
//! assert!(mask.test_and_set(7));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod bitset;
pub mod math;

pub use bitset::Bitset;
pub use math::{approx, mix, Vec3, TAU};
