// SPDX-License-Identifier: MIT OR Apache-2.0
//! Composite recipes built on the primitive filters.

pub mod grains_of_sand;

pub use grains_of_sand::GrainsOfSand;
