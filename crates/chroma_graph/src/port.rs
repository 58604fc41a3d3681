// SPDX-License-Identifier: MIT OR Apache-2.0
//! Image port definitions for node inputs/outputs.
//!
//! Ports carry image buffers between nodes and are addressed by name, the
//! way the host engine addresses pads (`"input"`, `"aux"`, `"output"`).
//! Parameter values are a separate, name-addressed surface on the node.

use serde::{Deserialize, Serialize};

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

/// An image port on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Port name
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    /// Whether this port must be connected for evaluation (inputs only)
    pub required: bool,
}

impl Port {
    /// Create a new input port
    pub fn input(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Input,
            required: false,
        }
    }

    /// Create a new output port
    pub fn output(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Output,
            required: false,
        }
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Check if a connection to another port is valid
    pub fn can_connect(&self, other: &Port) -> bool {
        // Must be opposite directions
        self.direction != other.direction
    }
}
