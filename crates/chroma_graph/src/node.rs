// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the filter graph framework.

use crate::param::{ParamError, ParamSpec, ParamValue};
use crate::port::Port;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Filter type id of the built-in pass-through node used for graph proxies
pub const PASSTHROUGH: &str = "chroma:nop";

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Declaration of a primitive filter kind.
///
/// The filter body is opaque to this crate: the declaration only carries the
/// image port surface and the parameter surface the host evaluator honors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterType {
    /// Unique type identifier, e.g. `"chroma:color-overlay"`
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Image input ports
    pub inputs: Vec<Port>,
    /// Image output ports
    pub outputs: Vec<Port>,
    /// Declared parameters
    pub params: Vec<ParamSpec>,
}

/// A filter node instance in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Filter type ID
    pub filter_type: String,
    /// Display name
    pub name: String,
    /// Image input ports
    pub inputs: Vec<Port>,
    /// Image output ports
    pub outputs: Vec<Port>,
    /// Parameter declarations, carried from the filter type
    pub params: Vec<ParamSpec>,
    /// Current parameter values by name
    values: IndexMap<String, ParamValue>,
}

impl Node {
    /// Create a new node from a filter type declaration.
    ///
    /// Parameter values start at the declared defaults (seed parameters get
    /// a fresh random seed).
    pub fn new(filter_type: &FilterType) -> Self {
        let values = filter_type
            .params
            .iter()
            .map(|spec| (spec.name.clone(), spec.instantiate()))
            .collect();
        Self {
            id: NodeId::new(),
            filter_type: filter_type.id.clone(),
            name: filter_type.name.clone(),
            inputs: filter_type.inputs.clone(),
            outputs: filter_type.outputs.clone(),
            params: filter_type.params.clone(),
            values,
        }
    }

    /// Create a pass-through node, used for graph boundary proxies
    pub fn passthrough(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            filter_type: PASSTHROUGH.to_string(),
            name: name.into(),
            inputs: vec![Port::input("input")],
            outputs: vec![Port::output("output")],
            params: Vec::new(),
            values: IndexMap::new(),
        }
    }

    /// Whether this node forwards its input unchanged
    pub fn is_passthrough(&self) -> bool {
        self.filter_type == PASSTHROUGH
    }

    /// Get an input port by name
    pub fn input(&self, name: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Get an output port by name
    pub fn output(&self, name: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// Get the declaration for a parameter
    pub fn param_spec(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|s| s.name == name)
    }

    /// Read a parameter value
    pub fn value(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Write a parameter value, conforming it to the declared domain.
    ///
    /// Out-of-range numeric input is clamped; a value of the wrong semantic
    /// type or an undeclared name is an error.
    pub fn set_value(&mut self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        let spec = self
            .params
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ParamError::Unknown(name.to_string()))?;
        let conformed = spec.conform(value)?;
        self.values.insert(name.to_string(), conformed);
        Ok(())
    }
}

/// Registry of available filter types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRegistry {
    /// Registered filter types by ID
    types: IndexMap<String, FilterType>,
}

impl FilterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Register a filter type
    pub fn register(&mut self, filter_type: FilterType) {
        self.types.insert(filter_type.id.clone(), filter_type);
    }

    /// Get a filter type by ID
    pub fn get(&self, id: &str) -> Option<&FilterType> {
        self.types.get(id)
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &FilterType> {
        self.types.values()
    }

    /// Create a node from a type ID
    pub fn create_node(&self, type_id: &str) -> Option<Node> {
        self.get(type_id).map(Node::new)
    }
}
