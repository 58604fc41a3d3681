// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing filter nodes and connections.
//!
//! Every graph carries two pass-through boundary proxies: the input proxy
//! (what the composite receives from upstream) and the output proxy (what it
//! hands back to the host). Interior nodes are wired between them.

use crate::connection::{Connection, ConnectionId};
use crate::node::{FilterRegistry, Node, NodeId};
use crate::port::PortDirection;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A filter node graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in the graph, boundary proxies included
    nodes: IndexMap<NodeId, Node>,
    /// Connections between nodes
    connections: IndexMap<ConnectionId, Connection>,
    /// Input boundary proxy
    input_proxy: NodeId,
    /// Output boundary proxy
    output_proxy: NodeId,
}

impl Graph {
    /// Create a new graph containing only the two boundary proxies
    pub fn new(name: impl Into<String>) -> Self {
        let input = Node::passthrough("input");
        let output = Node::passthrough("output");
        let input_proxy = input.id;
        let output_proxy = output.id;
        let mut nodes = IndexMap::new();
        nodes.insert(input_proxy, input);
        nodes.insert(output_proxy, output);
        Self {
            name: name.into(),
            nodes,
            connections: IndexMap::new(),
            input_proxy,
            output_proxy,
        }
    }

    /// The input boundary proxy
    pub fn input_proxy(&self) -> NodeId {
        self.input_proxy
    }

    /// The output boundary proxy
    pub fn output_proxy(&self) -> NodeId {
        self.output_proxy
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Instantiate a registered filter type and add it to the graph
    pub fn create_node(
        &mut self,
        registry: &FilterRegistry,
        type_id: &str,
    ) -> Result<NodeId, GraphError> {
        let node = registry
            .create_node(type_id)
            .ok_or_else(|| GraphError::UnknownFilterType(type_id.to_string()))?;
        tracing::debug!("created node {} ({type_id})", node.name);
        Ok(self.add_node(node))
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes, proxies included
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all nodes except the boundary proxies
    pub fn interior_nodes(&self) -> impl Iterator<Item = &Node> {
        let (input, output) = (self.input_proxy, self.output_proxy);
        self.nodes.values().filter(move |n| n.id != input && n.id != output)
    }

    /// Get the number of nodes, proxies included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the number of nodes excluding the boundary proxies
    pub fn interior_node_count(&self) -> usize {
        self.nodes.len() - 2
    }

    /// Connect an output port to an input port.
    ///
    /// Both nodes and both ports must exist, directions must match, and an
    /// input port accepts at most one incoming connection.
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_port: &str,
        to_node: NodeId,
        to_port: &str,
    ) -> Result<ConnectionId, ConnectionError> {
        let source_node = self
            .nodes
            .get(&from_node)
            .ok_or(ConnectionError::NodeNotFound(from_node))?;
        let target_node = self
            .nodes
            .get(&to_node)
            .ok_or(ConnectionError::NodeNotFound(to_node))?;

        let source_port = source_node
            .output(from_port)
            .or_else(|| source_node.input(from_port))
            .ok_or_else(|| ConnectionError::PortNotFound {
                node: source_node.name.clone(),
                port: from_port.to_string(),
            })?;
        let target_port = target_node
            .input(to_port)
            .or_else(|| target_node.output(to_port))
            .ok_or_else(|| ConnectionError::PortNotFound {
                node: target_node.name.clone(),
                port: to_port.to_string(),
            })?;

        if source_port.direction != PortDirection::Output || !source_port.can_connect(target_port) {
            return Err(ConnectionError::IncompatiblePorts);
        }

        // One incoming connection per input port
        if self.connections.values().any(|c| c.targets(to_node, to_port)) {
            return Err(ConnectionError::PortAlreadyConnected {
                node: target_node.name.clone(),
                port: to_port.to_string(),
            });
        }

        if from_node == to_node {
            return Err(ConnectionError::SelfLoop);
        }

        tracing::debug!(
            "connect {}:{from_port} -> {}:{to_port}",
            source_node.name,
            target_node.name
        );
        let connection = Connection::new(from_node, from_port, to_node, to_port);
        let id = connection.id;
        self.connections.insert(id, connection);
        Ok(id)
    }

    /// Link a chain of nodes, each node's `"output"` into the next node's
    /// `"input"`
    pub fn link_chain(&mut self, chain: &[NodeId]) -> Result<(), ConnectionError> {
        for pair in chain.windows(2) {
            self.connect(pair[0], "output", pair[1], "input")?;
        }
        Ok(())
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Find the source feeding an input port
    pub fn upstream(&self, node_id: NodeId, port: &str) -> Option<(NodeId, &str)> {
        self.connections
            .values()
            .find(|c| c.targets(node_id, port))
            .map(|c| (c.from_node, c.from_port.as_str()))
    }

    /// Get nodes in topological order (dependencies first)
    pub fn topological_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let mut visited = std::collections::HashSet::new();
        let mut temp_mark = std::collections::HashSet::new();
        let mut order = Vec::new();

        for node_id in self.nodes.keys() {
            if !visited.contains(node_id) {
                self.visit(*node_id, &mut visited, &mut temp_mark, &mut order)?;
            }
        }

        Ok(order)
    }

    fn visit(
        &self,
        node_id: NodeId,
        visited: &mut std::collections::HashSet<NodeId>,
        temp_mark: &mut std::collections::HashSet<NodeId>,
        order: &mut Vec<NodeId>,
    ) -> Result<(), CycleError> {
        if temp_mark.contains(&node_id) {
            return Err(CycleError);
        }
        if visited.contains(&node_id) {
            return Ok(());
        }

        temp_mark.insert(node_id);

        // Visit all nodes that this node depends on
        for connection in self.connections.values() {
            if connection.to_node == node_id {
                self.visit(connection.from_node, visited, temp_mark, order)?;
            }
        }

        temp_mark.remove(&node_id);
        visited.insert(node_id);
        order.push(node_id);

        Ok(())
    }

    /// Check the structural invariants: the graph is acyclic, and every node
    /// reachable from the output proxy has its required input ports connected.
    pub fn validate(&self) -> Result<(), GraphError> {
        self.topological_order()?;

        let mut pending = vec![self.output_proxy];
        let mut seen = std::collections::HashSet::new();
        while let Some(node_id) = pending.pop() {
            if !seen.insert(node_id) {
                continue;
            }
            let node = self.nodes.get(&node_id).ok_or(GraphError::DanglingNode(node_id))?;
            for port in &node.inputs {
                match self.upstream(node_id, &port.name) {
                    Some((source, _)) => pending.push(source),
                    None if port.required => {
                        return Err(GraphError::MissingRequiredInput {
                            node: node.name.clone(),
                            port: port.name.clone(),
                        });
                    }
                    None => {}
                }
            }
        }
        Ok(())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when creating a connection
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("port not found: {node}:{port}")]
    PortNotFound {
        /// Node display name
        node: String,
        /// Port name
        port: String,
    },

    /// Incompatible port directions
    #[error("incompatible ports")]
    IncompatiblePorts,

    /// Input port is already connected
    #[error("port already connected: {node}:{port}")]
    PortAlreadyConnected {
        /// Node display name
        node: String,
        /// Port name
        port: String,
    },

    /// Self-loop not allowed
    #[error("self-loop not allowed")]
    SelfLoop,
}

/// Structural error in a graph
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Filter type is not registered
    #[error("unknown filter type: {0}")]
    UnknownFilterType(String),

    /// Required input port is not connected
    #[error("required input not connected: {node}:{port}")]
    MissingRequiredInput {
        /// Node display name
        node: String,
        /// Port name
        port: String,
    },

    /// Connection references a node that is not in the graph
    #[error("connection references missing node: {0:?}")]
    DanglingNode(NodeId),

    /// Graph contains a cycle
    #[error(transparent)]
    Cycle(#[from] CycleError),
}

/// Error when a graph contains a cycle
#[derive(Debug, thiserror::Error)]
#[error("graph contains a cycle")]
pub struct CycleError;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::FilterType;
    use crate::param::ParamSpec;
    use crate::port::Port;

    fn registry() -> FilterRegistry {
        let mut registry = FilterRegistry::new();
        registry.register(FilterType {
            id: "chroma:blur".to_string(),
            name: "Blur".to_string(),
            description: String::new(),
            inputs: vec![Port::input("input").required()],
            outputs: vec![Port::output("output")],
            params: vec![ParamSpec::double("radius", "Radius", 1.0).with_range(0.0, 100.0)],
        });
        registry.register(FilterType {
            id: "chroma:over".to_string(),
            name: "Over".to_string(),
            description: String::new(),
            inputs: vec![Port::input("input").required(), Port::input("aux")],
            outputs: vec![Port::output("output")],
            params: vec![],
        });
        registry
    }

    #[test]
    fn test_new_graph_has_proxies() {
        let graph = Graph::new("test");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.interior_node_count(), 0);
        assert!(graph.node(graph.input_proxy()).unwrap().is_passthrough());
    }

    #[test]
    fn test_connect_validates_ports() {
        let registry = registry();
        let mut graph = Graph::new("test");
        let blur = graph.create_node(&registry, "chroma:blur").unwrap();
        let over = graph.create_node(&registry, "chroma:over").unwrap();

        assert!(graph.connect(blur, "output", over, "aux").is_ok());
        // Input ports accept a single connection
        let err = graph.connect(blur, "output", over, "aux").unwrap_err();
        assert!(matches!(err, ConnectionError::PortAlreadyConnected { .. }));
        // Unknown port name
        let err = graph.connect(blur, "output", over, "mask").unwrap_err();
        assert!(matches!(err, ConnectionError::PortNotFound { .. }));
        // Wrong direction
        let err = graph.connect(blur, "input", over, "aux").unwrap_err();
        assert!(matches!(err, ConnectionError::IncompatiblePorts));
        // Self-loop
        let err = graph.connect(blur, "output", blur, "input").unwrap_err();
        assert!(matches!(err, ConnectionError::SelfLoop));

        assert!(graph.create_node(&registry, "chroma:sharpen").is_err());
    }

    #[test]
    fn test_link_chain_and_validate() {
        let registry = registry();
        let mut graph = Graph::new("test");
        let blur = graph.create_node(&registry, "chroma:blur").unwrap();
        let over = graph.create_node(&registry, "chroma:over").unwrap();

        let input = graph.input_proxy();
        let output = graph.output_proxy();
        graph.link_chain(&[input, blur, over, output]).unwrap();
        graph.validate().unwrap();

        // A reachable node with a disconnected required input fails validation
        let mut incomplete = Graph::new("test");
        let blur = incomplete.create_node(&registry, "chroma:blur").unwrap();
        let output = incomplete.output_proxy();
        incomplete.connect(blur, "output", output, "input").unwrap();
        let err = incomplete.validate().unwrap_err();
        assert!(matches!(err, GraphError::MissingRequiredInput { .. }));
    }

    #[test]
    fn test_topological_order() {
        let registry = registry();
        let mut graph = Graph::new("test");
        let blur = graph.create_node(&registry, "chroma:blur").unwrap();
        let over = graph.create_node(&registry, "chroma:over").unwrap();
        let input = graph.input_proxy();
        let output = graph.output_proxy();
        graph.link_chain(&[input, blur, over, output]).unwrap();

        let order = graph.topological_order().unwrap();
        let pos = |id: NodeId| order.iter().position(|n| *n == id).unwrap();
        assert!(pos(input) < pos(blur));
        assert!(pos(blur) < pos(over));
        assert!(pos(over) < pos(output));
    }

    #[test]
    fn test_ron_round_trip() {
        let registry = registry();
        let mut graph = Graph::new("persisted");
        let blur = graph.create_node(&registry, "chroma:blur").unwrap();
        graph
            .link_chain(&[graph.input_proxy(), blur, graph.output_proxy()])
            .unwrap();

        let text = ron::to_string(&graph).unwrap();
        let loaded: Graph = ron::from_str(&text).unwrap();
        assert_eq!(loaded.name, graph.name);
        assert_eq!(loaded.node_count(), graph.node_count());
        assert_eq!(loaded.connection_count(), graph.connection_count());
        loaded.validate().unwrap();
    }
}
