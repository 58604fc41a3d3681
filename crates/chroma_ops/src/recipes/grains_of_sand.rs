// SPDX-License-Identifier: MIT OR Apache-2.0
//! Grains-of-sand text styling.
//!
//! Two layers are built from the same input: each one is color-filled,
//! spread by random pixel displacement, then shattered into small Voronoi
//! tiles. The front layer is composited over the back layer and the result
//! gets a lightness lift. With the default spreads the back layer scatters
//! wide while the front stays dense, which reads as loose sand around
//! solid lettering.

use crate::filters::{COLOR_OVERLAY, CUBISM, HUE_CHROMA, NOISE_SPREAD, OVER};
use chroma_graph::{
    AttachContext, AttachError, CompositeOp, FilterRegistry, OpDescriptor, ParamSpec, Recipe,
    Rgba, UiAxis, UiUnit,
};

/// The grains-of-sand composite operation
pub struct GrainsOfSand;

impl Recipe for GrainsOfSand {
    fn descriptor(&self) -> OpDescriptor {
        OpDescriptor::new("chroma:grains-of-sand", "Grains of Sand")
            .with_description("Style text like grains of sand")
            .with_menu("Filters/Text Styling", "Grains of Sand...")
            .with_reference_hash("33doa01va13x9xn3v25sb2ac")
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::double("lightness", "Lightness", 0.0)
                .with_description("Lightness adjustment")
                .with_range(0.0, 15.0),
            ParamSpec::color("value", "Color 1", Rgba::WHITE)
                .with_description("The color to paint over the front layer"),
            ParamSpec::int("amount_x", "Horizontal spread 1", 20)
                .with_description("Horizontal spread amount of the front layer")
                .with_range(15.0, 60.0)
                .with_unit(UiUnit::PixelDistance)
                .with_axis(UiAxis::X),
            ParamSpec::int("amount_y", "Vertical spread 1", 20)
                .with_description("Vertical spread amount of the front layer")
                .with_range(15.0, 60.0)
                .with_unit(UiUnit::PixelDistance)
                .with_axis(UiAxis::Y),
            ParamSpec::seed("seed", "Random seed"),
            ParamSpec::double("tilesize", "Tile size", 1.7)
                .with_description("Average diameter of each front tile (in pixels)")
                .with_range(1.5, 2.0)
                .with_unit(UiUnit::PixelDistance),
            ParamSpec::color("value2", "Color 2", Rgba::WHITE)
                .with_description("The color to paint over the back layer"),
            ParamSpec::int("amount_x2", "Horizontal spread 2", 180)
                .with_description("Horizontal spread amount of the back layer")
                .with_range(10.0, 512.0)
                .with_unit(UiUnit::PixelDistance)
                .with_axis(UiAxis::X),
            ParamSpec::int("amount_y2", "Vertical spread 2", 150)
                .with_description("Vertical spread amount of the back layer")
                .with_range(10.0, 512.0)
                .with_unit(UiUnit::PixelDistance)
                .with_axis(UiAxis::Y),
            ParamSpec::seed("seed2", "Random seed 2"),
            ParamSpec::double("tilesize2", "Tile size 2", 1.7)
                .with_description("Average diameter of each back tile (in pixels)")
                .with_range(1.5, 2.0)
                .with_unit(UiUnit::PixelDistance),
        ]
    }

    fn attach(&self, ctx: &mut AttachContext<'_>) -> Result<(), AttachError> {
        let input = ctx.input();
        let output = ctx.output();

        let color = ctx.node(COLOR_OVERLAY)?;
        let color2 = ctx.node(COLOR_OVERLAY)?;
        let spread = ctx.node(NOISE_SPREAD)?;
        let spread2 = ctx.node(NOISE_SPREAD)?;
        let cubism = ctx.node(CUBISM)?;
        let cubism2 = ctx.node(CUBISM)?;
        let over = ctx.node(OVER)?;
        let lightness = ctx.node(HUE_CHROMA)?;

        // Front chain runs through the composite into the lightness lift;
        // the back chain feeds the composite's aux pad.
        ctx.link(&[input, color, spread, cubism, over, lightness, output])?;
        ctx.link(&[input, color2, spread2, cubism2])?;
        ctx.connect(cubism2, "output", over, "aux")?;

        ctx.redirect("value", color, "value")?;
        ctx.redirect("value2", color2, "value")?;
        ctx.redirect("amount_x", spread, "amount-x")?;
        ctx.redirect("amount_y", spread, "amount-y")?;
        ctx.redirect("amount_y2", spread2, "amount-y")?;
        ctx.redirect("amount_x2", spread2, "amount-x")?;
        ctx.redirect("seed", spread, "seed")?;
        ctx.redirect("seed2", spread2, "seed")?;
        ctx.redirect("tilesize", cubism, "tile-size")?;
        ctx.redirect("tilesize2", cubism2, "tile-size")?;
        ctx.redirect("lightness", lightness, "lightness")?;

        Ok(())
    }
}

/// Instantiate a grains-of-sand operation over the given filter registry
pub fn grains_of_sand(registry: &FilterRegistry) -> Result<CompositeOp, AttachError> {
    CompositeOp::instantiate(&GrainsOfSand, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::create_filter_registry;
    use chroma_graph::evaluation::{EvaluationError, Evaluator, ResolvedInputs};
    use chroma_graph::{Node, NodeId, ParamValue};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    fn op() -> CompositeOp {
        grains_of_sand(&create_filter_registry()).unwrap()
    }

    /// Node a public parameter redirects to
    fn target(op: &CompositeOp, public: &str) -> NodeId {
        op.redirections()
            .find(|r| r.public_name == public)
            .unwrap()
            .node
    }

    fn upstream_of(op: &CompositeOp, node: NodeId, port: &str) -> NodeId {
        op.graph().upstream(node, port).unwrap().0
    }

    #[test]
    fn test_attach_builds_fixed_topology() {
        init_tracing();
        let op = op();
        let graph = op.graph();

        assert_eq!(graph.interior_node_count(), 8);
        assert_eq!(graph.node_count(), 10);
        assert_eq!(graph.connection_count(), 10);
        graph.validate().unwrap();

        let count = |kind: &str| graph.interior_nodes().filter(|n| n.filter_type == kind).count();
        assert_eq!(count(COLOR_OVERLAY), 2);
        assert_eq!(count(NOISE_SPREAD), 2);
        assert_eq!(count(CUBISM), 2);
        assert_eq!(count(OVER), 1);
        assert_eq!(count(HUE_CHROMA), 1);

        // Walk the front chain backwards from the output proxy
        let lightness = upstream_of(&op, graph.output_proxy(), "input");
        assert_eq!(lightness, target(&op, "lightness"));
        let over = upstream_of(&op, lightness, "input");
        let cubism = upstream_of(&op, over, "input");
        assert_eq!(cubism, target(&op, "tilesize"));
        let spread = upstream_of(&op, cubism, "input");
        assert_eq!(spread, target(&op, "amount_x"));
        let color = upstream_of(&op, spread, "input");
        assert_eq!(color, target(&op, "value"));
        assert_eq!(upstream_of(&op, color, "input"), graph.input_proxy());

        // The back chain feeds the composite's aux pad
        let cubism2 = upstream_of(&op, over, "aux");
        assert_eq!(cubism2, target(&op, "tilesize2"));
        let spread2 = upstream_of(&op, cubism2, "input");
        assert_eq!(spread2, target(&op, "amount_x2"));
        let color2 = upstream_of(&op, spread2, "input");
        assert_eq!(color2, target(&op, "value2"));
        assert_eq!(upstream_of(&op, color2, "input"), graph.input_proxy());
    }

    #[test]
    fn test_defaults_reach_internal_nodes() {
        let op = op();
        assert_eq!(op.redirected_value("value"), Some(&ParamValue::Color(Rgba::WHITE)));
        assert_eq!(op.redirected_value("lightness"), Some(&ParamValue::Double(0.0)));
        // Public defaults override the primitives' own defaults
        assert_eq!(op.redirected_value("amount_x"), Some(&ParamValue::Int(20)));
        assert_eq!(op.redirected_value("amount_y"), Some(&ParamValue::Int(20)));
        assert_eq!(op.redirected_value("amount_x2"), Some(&ParamValue::Int(180)));
        assert_eq!(op.redirected_value("amount_y2"), Some(&ParamValue::Int(150)));
        assert_eq!(op.redirected_value("tilesize"), Some(&ParamValue::Double(1.7)));
        assert_eq!(op.redirected_value("tilesize2"), Some(&ParamValue::Double(1.7)));
    }

    #[test]
    fn test_out_of_range_input_clamps() {
        let mut op = op();
        op.set_parameter("amount_x", ParamValue::Int(5)).unwrap();
        assert_eq!(op.redirected_value("amount_x"), Some(&ParamValue::Int(15)));
        op.set_parameter("amount_x", ParamValue::Int(500)).unwrap();
        assert_eq!(op.redirected_value("amount_x"), Some(&ParamValue::Int(60)));
        op.set_parameter("lightness", ParamValue::Double(20.0)).unwrap();
        assert_eq!(op.redirected_value("lightness"), Some(&ParamValue::Double(15.0)));
    }

    #[test]
    fn test_redirection_write_through() {
        let mut op = op();
        let cyan = Rgba::from_hex("#00f9ff").unwrap();
        op.set_parameter("value2", ParamValue::Color(cyan)).unwrap();
        assert_eq!(op.redirected_value("value2"), Some(&ParamValue::Color(cyan)));
        // The front overlay is untouched
        assert_eq!(op.redirected_value("value"), Some(&ParamValue::Color(Rgba::WHITE)));

        op.set_parameter("tilesize2", ParamValue::Double(1.9)).unwrap();
        assert_eq!(op.redirected_value("tilesize2"), Some(&ParamValue::Double(1.9)));

        op.set_parameter("seed", ParamValue::Seed(42)).unwrap();
        assert_eq!(op.redirected_value("seed"), Some(&ParamValue::Seed(42)));
    }

    #[test]
    fn test_attach_twice_rejected() {
        let registry = create_filter_registry();
        let mut op = grains_of_sand(&registry).unwrap();
        let err = op.attach(&GrainsOfSand, &registry).unwrap_err();
        assert!(matches!(err, AttachError::AlreadyAttached));
        assert_eq!(op.graph().interior_node_count(), 8);
    }

    #[test]
    fn test_seeds_randomized_per_instance() {
        let a = op();
        let b = op();
        let seeds = |op: &CompositeOp| {
            (
                op.parameter("seed").and_then(ParamValue::as_seed).unwrap(),
                op.parameter("seed2").and_then(ParamValue::as_seed).unwrap(),
            )
        };
        assert_ne!(seeds(&a), seeds(&b));
        // The instance seed is what the spread nodes see
        let c = op();
        assert_eq!(c.parameter("seed"), c.redirected_value("seed"));
        assert_eq!(c.parameter("seed2"), c.redirected_value("seed2"));
    }

    #[test]
    fn test_descriptor_keys() {
        let descriptor = GrainsOfSand.descriptor();
        assert_eq!(descriptor.name, "chroma:grains-of-sand");
        assert_eq!(descriptor.title, "Grains of Sand");
        assert_eq!(descriptor.menu_label.as_deref(), Some("Grains of Sand..."));
        assert_eq!(
            descriptor.reference_hash.as_deref(),
            Some("33doa01va13x9xn3v25sb2ac")
        );
    }

    /// Stub evaluator tracing which filter saw which inputs
    struct LayerTrace;

    impl Evaluator for LayerTrace {
        type Buffer = String;

        fn evaluate(
            &mut self,
            node: &Node,
            inputs: &ResolvedInputs<String>,
        ) -> Result<String, EvaluationError> {
            let kind = node.filter_type.trim_start_matches("chroma:");
            let main = inputs.require(node, "input")?;
            Ok(match inputs.get("aux") {
                Some(aux) => format!("{kind}({main} <- {aux})"),
                None => format!("{kind}({main})"),
            })
        }
    }

    #[test]
    fn test_pull_composes_both_layers() {
        let op = op();
        let out = op.pull(&mut LayerTrace, "src".to_string()).unwrap();
        let layer = "cubism(noise-spread(color-overlay(src)))";
        assert_eq!(out, format!("hue-chroma(over({layer} <- {layer}))"));
    }

    #[test]
    fn test_graph_round_trips_through_ron() {
        let op = op();
        let text = ron::to_string(op.graph()).unwrap();
        let loaded: chroma_graph::Graph = ron::from_str(&text).unwrap();
        assert_eq!(loaded.node_count(), op.graph().node_count());
        assert_eq!(loaded.connection_count(), op.graph().connection_count());
        loaded.validate().unwrap();
    }
}
