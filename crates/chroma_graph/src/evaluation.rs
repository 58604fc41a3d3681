// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pull-based graph evaluation.
//!
//! Evaluation is lazy and owned by the host: the engine resolves the
//! dependency walk from the output proxy and memoizes per-node results, while
//! the filter bodies themselves live behind the [`Evaluator`] trait. The
//! buffer type is generic; this crate never touches pixels.

use crate::graph::Graph;
use crate::node::{Node, NodeId};
use std::collections::HashMap;

/// Input buffers resolved for one node, by input port name
#[derive(Debug)]
pub struct ResolvedInputs<B> {
    values: HashMap<String, B>,
}

impl<B> ResolvedInputs<B> {
    fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Get the buffer connected to an input port
    pub fn get(&self, port: &str) -> Option<&B> {
        self.values.get(port)
    }

    /// Get the buffer connected to an input port, or fail evaluation
    pub fn require(&self, node: &Node, port: &str) -> Result<&B, EvaluationError> {
        self.values.get(port).ok_or_else(|| EvaluationError::MissingInput {
            node: node.name.clone(),
            port: port.to_string(),
        })
    }
}

/// Capability implemented by the host engine: evaluate one primitive filter
/// node over its resolved inputs.
pub trait Evaluator {
    /// Image buffer type produced and consumed by filters
    type Buffer: Clone;

    /// Evaluate a node and produce its output buffer
    fn evaluate(
        &mut self,
        node: &Node,
        inputs: &ResolvedInputs<Self::Buffer>,
    ) -> Result<Self::Buffer, EvaluationError>;
}

/// Context for one evaluation pass over a graph
pub struct EvaluationContext<'a, E: Evaluator> {
    graph: &'a Graph,
    evaluator: &'a mut E,
    cache: HashMap<NodeId, E::Buffer>,
}

impl<'a, E: Evaluator> EvaluationContext<'a, E> {
    /// Create a new evaluation context.
    ///
    /// Fails if the graph contains a cycle.
    pub fn new(graph: &'a Graph, evaluator: &'a mut E) -> Result<Self, EvaluationError> {
        graph
            .topological_order()
            .map_err(|_| EvaluationError::CycleDetected)?;
        Ok(Self {
            graph,
            evaluator,
            cache: HashMap::new(),
        })
    }

    /// Pull the output proxy, evaluating dependencies recursively.
    ///
    /// `input` is the buffer the composite receives on its input proxy.
    /// Results are memoized per node, so shared upstream work runs once.
    pub fn pull(&mut self, input: E::Buffer) -> Result<E::Buffer, EvaluationError> {
        self.cache.insert(self.graph.input_proxy(), input);
        self.eval_node(self.graph.output_proxy())
    }

    fn eval_node(&mut self, node_id: NodeId) -> Result<E::Buffer, EvaluationError> {
        if let Some(buffer) = self.cache.get(&node_id) {
            return Ok(buffer.clone());
        }

        let graph = self.graph;
        let node = graph
            .node(node_id)
            .ok_or(EvaluationError::NodeNotFound(node_id))?;

        let mut inputs = ResolvedInputs::new();
        for port in &node.inputs {
            match graph.upstream(node_id, &port.name) {
                Some((source, _)) => {
                    let buffer = self.eval_node(source)?;
                    inputs.values.insert(port.name.clone(), buffer);
                }
                None if port.required => {
                    return Err(EvaluationError::MissingInput {
                        node: node.name.clone(),
                        port: port.name.clone(),
                    });
                }
                None => {}
            }
        }

        let result = if node.is_passthrough() {
            inputs.require(node, "input")?.clone()
        } else {
            self.evaluator.evaluate(node, &inputs)?
        };
        self.cache.insert(node_id, result.clone());
        Ok(result)
    }
}

/// Error during evaluation
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    /// Graph contains a cycle
    #[error("graph contains a cycle")]
    CycleDetected,

    /// Node not found
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Missing required input
    #[error("missing input: {node}:{port}")]
    MissingInput {
        /// Node display name
        node: String,
        /// Port name
        port: String,
    },

    /// Error raised by the host's filter implementation
    #[error("{0}")]
    Filter(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{FilterRegistry, FilterType};
    use crate::port::Port;

    /// Stub evaluator that tags buffers with the node names that produced
    /// them and counts invocations per node.
    struct TraceEvaluator {
        calls: HashMap<String, usize>,
    }

    impl TraceEvaluator {
        fn new() -> Self {
            Self {
                calls: HashMap::new(),
            }
        }
    }

    impl Evaluator for TraceEvaluator {
        type Buffer = String;

        fn evaluate(
            &mut self,
            node: &Node,
            inputs: &ResolvedInputs<String>,
        ) -> Result<String, EvaluationError> {
            *self.calls.entry(node.name.clone()).or_insert(0) += 1;
            let main = inputs.require(node, "input")?;
            match inputs.get("aux") {
                Some(aux) => Ok(format!("{}({main}, {aux})", node.name)),
                None => Ok(format!("{}({main})", node.name)),
            }
        }
    }

    fn registry() -> FilterRegistry {
        let mut registry = FilterRegistry::new();
        registry.register(FilterType {
            id: "test:stage".to_string(),
            name: "stage".to_string(),
            description: String::new(),
            inputs: vec![Port::input("input").required()],
            outputs: vec![Port::output("output")],
            params: vec![],
        });
        registry.register(FilterType {
            id: "test:merge".to_string(),
            name: "merge".to_string(),
            description: String::new(),
            inputs: vec![Port::input("input").required(), Port::input("aux")],
            outputs: vec![Port::output("output")],
            params: vec![],
        });
        registry
    }

    #[test]
    fn test_pull_walks_dependencies() {
        let registry = registry();
        let mut graph = Graph::new("test");
        let stage = graph.create_node(&registry, "test:stage").unwrap();
        graph
            .link_chain(&[graph.input_proxy(), stage, graph.output_proxy()])
            .unwrap();

        let mut evaluator = TraceEvaluator::new();
        let mut ctx = EvaluationContext::new(&graph, &mut evaluator).unwrap();
        let out = ctx.pull("src".to_string()).unwrap();
        assert_eq!(out, "stage(src)");
    }

    #[test]
    fn test_shared_upstream_is_memoized() {
        let registry = registry();
        let mut graph = Graph::new("test");
        let stage = graph.create_node(&registry, "test:stage").unwrap();
        let merge = graph.create_node(&registry, "test:merge").unwrap();

        // Diamond: one stage feeds both inputs of the merge
        let input = graph.input_proxy();
        graph.connect(input, "output", stage, "input").unwrap();
        graph.connect(stage, "output", merge, "input").unwrap();
        graph.connect(stage, "output", merge, "aux").unwrap();
        graph
            .connect(merge, "output", graph.output_proxy(), "input")
            .unwrap();

        let mut evaluator = TraceEvaluator::new();
        let mut ctx = EvaluationContext::new(&graph, &mut evaluator).unwrap();
        let out = ctx.pull("src".to_string()).unwrap();
        assert_eq!(out, "merge(stage(src), stage(src))");
        assert_eq!(evaluator.calls["stage"], 1);
    }

    #[test]
    fn test_unconnected_required_input_fails() {
        let registry = registry();
        let mut graph = Graph::new("test");
        let stage = graph.create_node(&registry, "test:stage").unwrap();
        graph
            .connect(stage, "output", graph.output_proxy(), "input")
            .unwrap();

        let mut evaluator = TraceEvaluator::new();
        let mut ctx = EvaluationContext::new(&graph, &mut evaluator).unwrap();
        let err = ctx.pull("src".to_string()).unwrap_err();
        assert!(matches!(err, EvaluationError::MissingInput { .. }));
    }
}
