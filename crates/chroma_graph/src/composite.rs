// SPDX-License-Identifier: MIT OR Apache-2.0
//! Composite operations: reusable graph templates with a public parameter
//! surface.
//!
//! A composite operation declares its parameters once, builds its internal
//! graph exactly once at attach time, and forwards later parameter writes to
//! internal node ports through a redirection table. The host never sees the
//! internal structure.

use crate::evaluation::{EvaluationContext, EvaluationError, Evaluator};
use crate::graph::{ConnectionError, Graph, GraphError};
use crate::node::{FilterRegistry, NodeId};
use crate::param::{ParamError, ParamSpec, ParamValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Class-level descriptor of a composite operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpDescriptor {
    /// Operation name, e.g. `"chroma:grains-of-sand"`
    pub name: String,
    /// Display title
    pub title: String,
    /// Description
    pub description: String,
    /// Menu placement path
    pub menu_path: Option<String>,
    /// Menu entry label
    pub menu_label: Option<String>,
    /// Content-addressed hash for regression baselines
    pub reference_hash: Option<String>,
}

impl OpDescriptor {
    /// Create a descriptor with a name and title
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            description: String::new(),
            menu_path: None,
            menu_label: None,
            reference_hash: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the menu placement
    pub fn with_menu(mut self, path: impl Into<String>, label: impl Into<String>) -> Self {
        self.menu_path = Some(path.into());
        self.menu_label = Some(label.into());
        self
    }

    /// Set the regression baseline hash
    pub fn with_reference_hash(mut self, hash: impl Into<String>) -> Self {
        self.reference_hash = Some(hash.into());
        self
    }
}

/// Mapping from a public parameter to an internal node's parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redirection {
    /// Public parameter name
    pub public_name: String,
    /// Target node
    pub node: NodeId,
    /// Target parameter name on the node
    pub param: String,
}

/// A reusable composite operation definition: descriptor, public parameters,
/// and the attach-time wiring of the internal graph.
pub trait Recipe {
    /// The class-level descriptor
    fn descriptor(&self) -> OpDescriptor;

    /// The declared public parameters
    fn parameters(&self) -> Vec<ParamSpec>;

    /// Build the internal graph and register one redirection per public
    /// parameter. Called exactly once per instance; must not evaluate
    /// anything.
    fn attach(&self, ctx: &mut AttachContext<'_>) -> Result<(), AttachError>;
}

/// Construction surface handed to [`Recipe::attach`]
pub struct AttachContext<'a> {
    graph: &'a mut Graph,
    registry: &'a FilterRegistry,
    specs: &'a IndexMap<String, ParamSpec>,
    values: &'a IndexMap<String, ParamValue>,
    redirections: &'a mut IndexMap<String, Redirection>,
}

impl AttachContext<'_> {
    /// The instance's input boundary proxy
    pub fn input(&self) -> NodeId {
        self.graph.input_proxy()
    }

    /// The instance's output boundary proxy
    pub fn output(&self) -> NodeId {
        self.graph.output_proxy()
    }

    /// Instantiate a registered filter type as an internal node
    pub fn node(&mut self, type_id: &str) -> Result<NodeId, AttachError> {
        Ok(self.graph.create_node(self.registry, type_id)?)
    }

    /// Link a chain of nodes, output into the next node's `"input"`
    pub fn link(&mut self, chain: &[NodeId]) -> Result<(), AttachError> {
        self.graph.link_chain(chain)?;
        Ok(())
    }

    /// Connect an output port to a named input port (e.g. an `"aux"` pad)
    pub fn connect(
        &mut self,
        from: NodeId,
        from_port: &str,
        to: NodeId,
        to_port: &str,
    ) -> Result<(), AttachError> {
        self.graph.connect(from, from_port, to, to_port)?;
        Ok(())
    }

    /// Redirect a public parameter to an internal node's parameter.
    ///
    /// The public name must be declared and not yet redirected; the target
    /// node and parameter must exist. The current public value is forwarded
    /// to the target immediately, so internal nodes reflect the public
    /// defaults as soon as attachment completes.
    pub fn redirect(
        &mut self,
        public_name: &str,
        node: NodeId,
        param: &str,
    ) -> Result<(), AttachError> {
        if !self.specs.contains_key(public_name) {
            return Err(AttachError::UndeclaredParameter(public_name.to_string()));
        }
        if self.redirections.contains_key(public_name) {
            return Err(AttachError::DuplicateRedirection(public_name.to_string()));
        }
        let target = self
            .graph
            .node_mut(node)
            .filter(|n| n.param_spec(param).is_some())
            .ok_or_else(|| AttachError::UnknownRedirectTarget {
                public_name: public_name.to_string(),
                param: param.to_string(),
            })?;

        if let Some(value) = self.values.get(public_name) {
            target.set_value(param, value.clone())?;
        }

        self.redirections.insert(
            public_name.to_string(),
            Redirection {
                public_name: public_name.to_string(),
                node,
                param: param.to_string(),
            },
        );
        Ok(())
    }
}

/// A composite operation instance
pub struct CompositeOp {
    descriptor: OpDescriptor,
    specs: IndexMap<String, ParamSpec>,
    values: IndexMap<String, ParamValue>,
    graph: Graph,
    redirections: IndexMap<String, Redirection>,
    attached: bool,
}

impl CompositeOp {
    /// Declare a new instance: descriptor and public parameters only, no
    /// graph yet. Parameter values start at the declared defaults.
    pub fn new(recipe: &dyn Recipe) -> Result<Self, AttachError> {
        let descriptor = recipe.descriptor();
        let mut specs = IndexMap::new();
        let mut values = IndexMap::new();
        for spec in recipe.parameters() {
            if specs.contains_key(&spec.name) {
                return Err(AttachError::DuplicateParameter(spec.name));
            }
            values.insert(spec.name.clone(), spec.instantiate());
            specs.insert(spec.name.clone(), spec);
        }
        let graph = Graph::new(descriptor.name.clone());
        Ok(Self {
            descriptor,
            specs,
            values,
            graph,
            redirections: IndexMap::new(),
            attached: false,
        })
    }

    /// Build the internal graph. Called exactly once per instance by the
    /// host; a second call is rejected.
    ///
    /// After the recipe has wired its nodes, every declared parameter must
    /// have a redirection and the graph must pass structural validation. On
    /// any error the instance is left unattached; no partially correct graph
    /// is exposed.
    pub fn attach(&mut self, recipe: &dyn Recipe, registry: &FilterRegistry) -> Result<(), AttachError> {
        if self.attached {
            return Err(AttachError::AlreadyAttached);
        }
        tracing::debug!("attach {}", self.descriptor.name);

        let mut ctx = AttachContext {
            graph: &mut self.graph,
            registry,
            specs: &self.specs,
            values: &self.values,
            redirections: &mut self.redirections,
        };
        recipe.attach(&mut ctx)?;

        for name in self.specs.keys() {
            if !self.redirections.contains_key(name) {
                return Err(AttachError::MissingRedirection(name.clone()));
            }
        }
        self.graph.validate()?;
        self.attached = true;
        Ok(())
    }

    /// Declare and attach in one step
    pub fn instantiate(recipe: &dyn Recipe, registry: &FilterRegistry) -> Result<Self, AttachError> {
        let mut op = Self::new(recipe)?;
        op.attach(recipe, registry)?;
        Ok(op)
    }

    /// The class-level descriptor
    pub fn descriptor(&self) -> &OpDescriptor {
        &self.descriptor
    }

    /// The declared public parameters, in declaration order
    pub fn parameters(&self) -> impl Iterator<Item = &ParamSpec> {
        self.specs.values()
    }

    /// The internal graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The registered redirections, in registration order
    pub fn redirections(&self) -> impl Iterator<Item = &Redirection> {
        self.redirections.values()
    }

    /// Whether [`attach`](Self::attach) has completed
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Write a public parameter, forwarding it through the redirection table.
    ///
    /// The value is conformed against the public declaration (out-of-range
    /// numeric input clamps to the boundary), stored, and written into the
    /// target node. No recomputation is triggered; evaluation stays lazy.
    pub fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        let spec = self
            .specs
            .get(name)
            .ok_or_else(|| ParamError::Unknown(name.to_string()))?;
        let conformed = spec.conform(value)?;
        tracing::debug!("set {}.{name} = {conformed:?}", self.descriptor.name);
        self.values.insert(name.to_string(), conformed.clone());

        if let Some(redirection) = self.redirections.get(name) {
            if let Some(node) = self.graph.node_mut(redirection.node) {
                node.set_value(&redirection.param, conformed)?;
            }
        }
        Ok(())
    }

    /// Read a public parameter's current value
    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Read the internal node value a public parameter redirects to
    pub fn redirected_value(&self, name: &str) -> Option<&ParamValue> {
        let redirection = self.redirections.get(name)?;
        self.graph.node(redirection.node)?.value(&redirection.param)
    }

    /// Pull the output proxy through a host evaluator
    pub fn pull<E: Evaluator>(
        &self,
        evaluator: &mut E,
        input: E::Buffer,
    ) -> Result<E::Buffer, EvaluationError> {
        EvaluationContext::new(&self.graph, evaluator)?.pull(input)
    }
}

/// Error while constructing a composite operation.
///
/// These are configuration errors: the definition itself is malformed, and
/// construction aborts rather than producing a partially correct graph.
#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    /// Attach was already called on this instance
    #[error("operation is already attached")]
    AlreadyAttached,

    /// A parameter name was declared twice
    #[error("duplicate parameter declaration: {0}")]
    DuplicateParameter(String),

    /// A redirection names an undeclared public parameter
    #[error("redirection of undeclared parameter: {0}")]
    UndeclaredParameter(String),

    /// A public parameter was redirected twice
    #[error("parameter redirected twice: {0}")]
    DuplicateRedirection(String),

    /// A redirection targets a missing node or parameter
    #[error("redirection of {public_name} targets unknown parameter {param}")]
    UnknownRedirectTarget {
        /// Public parameter name
        public_name: String,
        /// Target parameter name
        param: String,
    },

    /// A declared parameter was never redirected
    #[error("parameter never redirected: {0}")]
    MissingRedirection(String),

    /// Structural graph error
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Wiring error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Parameter forwarding error
    #[error(transparent)]
    Param(#[from] ParamError),
}
