// SPDX-License-Identifier: MIT OR Apache-2.0
//! Primitive filter declarations.
//!
//! These declare the outside of each filter: image ports and parameters.
//! The bodies (noise displacement, Voronoi tiling, compositing math, color
//! adjustment) belong to the host engine's evaluator and are opaque here.

use chroma_graph::node::{FilterRegistry, FilterType};
use chroma_graph::param::{ParamSpec, Rgba, UiAxis, UiUnit};
use chroma_graph::port::Port;

/// Paints a color over the input, keeping the input's alpha
pub const COLOR_OVERLAY: &str = "chroma:color-overlay";
/// Displaces each pixel by a random amount
pub const NOISE_SPREAD: &str = "chroma:noise-spread";
/// Voronoi-style tile decomposition
pub const CUBISM: &str = "chroma:cubism";
/// Alpha-over composite of an aux image onto the input
pub const OVER: &str = "chroma:over";
/// Hue, chroma and lightness adjustment in CIE LCh
pub const HUE_CHROMA: &str = "chroma:hue-chroma";

/// Create the registry of primitive filter types
pub fn create_filter_registry() -> FilterRegistry {
    let mut registry = FilterRegistry::new();

    registry.register(FilterType {
        id: COLOR_OVERLAY.to_string(),
        name: "Color Overlay".to_string(),
        description: "Paint a color over the input, preserving its alpha".to_string(),
        inputs: vec![Port::input("input").required()],
        outputs: vec![Port::output("output")],
        params: vec![
            ParamSpec::color("value", "Color", Rgba::WHITE)
                .with_description("The color to paint over the input"),
        ],
    });

    registry.register(FilterType {
        id: NOISE_SPREAD.to_string(),
        name: "Noise Spread".to_string(),
        description: "Move pixels around randomly".to_string(),
        inputs: vec![Port::input("input").required()],
        outputs: vec![Port::output("output")],
        params: vec![
            ParamSpec::int("amount-x", "Horizontal", 5)
                .with_description("Horizontal spread amount")
                .with_range(0.0, 512.0)
                .with_unit(UiUnit::PixelDistance)
                .with_axis(UiAxis::X),
            ParamSpec::int("amount-y", "Vertical", 5)
                .with_description("Vertical spread amount")
                .with_range(0.0, 512.0)
                .with_unit(UiUnit::PixelDistance)
                .with_axis(UiAxis::Y),
            ParamSpec::seed("seed", "Random seed"),
        ],
    });

    registry.register(FilterType {
        id: CUBISM.to_string(),
        name: "Cubism".to_string(),
        description: "Scatter the image into randomly rotated square tiles".to_string(),
        inputs: vec![Port::input("input").required()],
        outputs: vec![Port::output("output")],
        params: vec![
            ParamSpec::double("tile-size", "Tile size", 10.0)
                .with_description("Average diameter of each tile (in pixels)")
                .with_range(0.0, 256.0)
                .with_unit(UiUnit::PixelDistance),
            ParamSpec::double("tile-saturation", "Tile saturation", 2.5)
                .with_description("Expand tiles by this amount")
                .with_range(0.0, 10.0),
            ParamSpec::color("bg-color", "Background color", Rgba::TRANSPARENT)
                .with_description("The tiles' background color"),
            ParamSpec::seed("seed", "Random seed"),
        ],
    });

    registry.register(FilterType {
        id: OVER.to_string(),
        name: "Normal compositing".to_string(),
        description: "Porter Duff over: draw the aux image onto the input".to_string(),
        inputs: vec![Port::input("input").required(), Port::input("aux")],
        outputs: vec![Port::output("output")],
        params: vec![],
    });

    registry.register(FilterType {
        id: HUE_CHROMA.to_string(),
        name: "Hue-Chroma".to_string(),
        description: "Adjust hue, chroma and lightness".to_string(),
        inputs: vec![Port::input("input").required()],
        outputs: vec![Port::output("output")],
        params: vec![
            ParamSpec::double("hue", "Hue", 0.0)
                .with_description("Hue rotation, in degrees")
                .with_range(-180.0, 180.0)
                .with_unit(UiUnit::Degree),
            ParamSpec::double("chroma", "Chroma", 0.0)
                .with_description("Chroma adjustment")
                .with_range(-100.0, 100.0),
            ParamSpec::double("lightness", "Lightness", 0.0)
                .with_description("Lightness adjustment")
                .with_range(-100.0, 100.0),
        ],
    });

    registry
}
