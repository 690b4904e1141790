//! Various math utilities.

mod face;

pub mod noise;

pub use face::Face;
