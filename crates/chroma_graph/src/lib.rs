// SPDX-License-Identifier: MIT OR Apache-2.0
//! Filter node graph framework for chroma.
//!
//! This crate provides the composition engine that powers chroma's filter
//! operations:
//! - Declared primitive filter types with image ports and typed parameters
//! - Graph wiring with boundary proxies and structural validation
//! - Composite operations: fixed graph templates exposing a public parameter
//!   surface through a redirection table
//! - Pull-based lazy evaluation over a host-supplied evaluator
//!
//! ## Architecture
//!
//! Primitive filter bodies are opaque here: a [`FilterType`] only declares
//! what a filter looks like from the outside. The host engine implements
//! [`evaluation::Evaluator`] to give the nodes meaning; this crate owns
//! structure, wiring, and parameter forwarding.

pub mod param;
pub mod port;
pub mod node;
pub mod connection;
pub mod graph;
pub mod composite;
pub mod evaluation;

pub use composite::{AttachContext, AttachError, CompositeOp, OpDescriptor, Recipe, Redirection};
pub use connection::{Connection, ConnectionId};
pub use graph::{ConnectionError, CycleError, Graph, GraphError};
pub use node::{FilterRegistry, FilterType, Node, NodeId};
pub use param::{ParamDomain, ParamError, ParamSpec, ParamType, ParamValue, Rgba, UiAxis, UiUnit};
pub use port::{Port, PortDirection};
