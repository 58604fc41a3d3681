// SPDX-License-Identifier: MIT OR Apache-2.0
//! Filter declarations and composite recipes for chroma.
//!
//! [`filters`] declares the primitive filter kinds the engine composes;
//! [`recipes`] holds the composite operations wired from them. Filter
//! bodies are supplied by the host engine's evaluator.

pub mod filters;
pub mod recipes;

pub use filters::create_filter_registry;
pub use recipes::GrainsOfSand;
