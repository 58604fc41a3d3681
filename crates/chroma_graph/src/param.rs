// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parameter declarations and values for filter nodes.

use serde::{Deserialize, Serialize};

/// Semantic type of a declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamType {
    /// Floating point value
    Double,
    /// Integer value
    Int,
    /// RGBA color
    Color,
    /// Random seed
    Seed,
}

/// An RGBA color with components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    /// Red component
    pub r: f32,
    /// Green component
    pub g: f32,
    /// Blue component
    pub b: f32,
    /// Alpha component
    pub a: f32,
}

impl Rgba {
    /// Opaque white
    pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    /// Opaque black
    pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    /// Fully transparent black
    pub const TRANSPARENT: Self = Self { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

    /// Create an opaque color from RGB components
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse a `#rrggbb` or `#rrggbbaa` hex string
    pub fn from_hex(s: &str) -> Result<Self, ParamError> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if !digits.is_ascii() {
            return Err(ParamError::MalformedColor(s.to_string()));
        }
        let byte = |i: usize| -> Result<f32, ParamError> {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map(|b| f32::from(b) / 255.0)
                .map_err(|_| ParamError::MalformedColor(s.to_string()))
        };
        match digits.len() {
            6 => Ok(Self { r: byte(0)?, g: byte(2)?, b: byte(4)?, a: 1.0 }),
            8 => Ok(Self { r: byte(0)?, g: byte(2)?, b: byte(4)?, a: byte(6)? }),
            _ => Err(ParamError::MalformedColor(s.to_string())),
        }
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque
    pub fn to_hex(&self) -> String {
        let byte = |x: f32| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
        if self.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
        } else {
            format!(
                "#{:02x}{:02x}{:02x}{:02x}",
                byte(self.r),
                byte(self.g),
                byte(self.b),
                byte(self.a)
            )
        }
    }
}

impl Serialize for Rgba {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A concrete parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Floating point
    Double(f64),
    /// Integer
    Int(i32),
    /// RGBA color
    Color(Rgba),
    /// Random seed
    Seed(u32),
}

impl ParamValue {
    /// Get the semantic type of this value
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::Double(_) => ParamType::Double,
            Self::Int(_) => ParamType::Int,
            Self::Color(_) => ParamType::Color,
            Self::Seed(_) => ParamType::Seed,
        }
    }

    /// Get as a double, converting integers
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Int(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    /// Get as an integer
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as a color
    pub fn as_color(&self) -> Option<Rgba> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Get as a seed
    pub fn as_seed(&self) -> Option<u32> {
        match self {
            Self::Seed(s) => Some(*s),
            _ => None,
        }
    }
}

/// Valid domain for a numeric parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamDomain {
    /// Any value of the declared type
    Any,
    /// Inclusive numeric range
    Range {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
}

impl ParamDomain {
    fn clamp(&self, v: f64) -> f64 {
        match self {
            Self::Any => v,
            Self::Range { min, max } => v.clamp(*min, *max),
        }
    }
}

/// Default value policy for a parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamDefault {
    /// Fixed declared default
    Value(ParamValue),
    /// Fresh random seed per instantiation
    RandomSeed,
}

/// Unit hint for UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiUnit {
    /// Distance in pixels
    PixelDistance,
    /// Angle in degrees
    Degree,
}

/// Axis hint for UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiAxis {
    /// Horizontal
    X,
    /// Vertical
    Y,
}

/// Declaration of a single parameter: type, default, domain, UI metadata.
///
/// Immutable after declaration; owned by a filter type or a composite
/// operation definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name (stable identifier)
    pub name: String,
    /// Display title
    pub title: String,
    /// Description
    pub description: String,
    /// Semantic type
    pub ty: ParamType,
    /// Default value policy
    pub default: ParamDefault,
    /// Valid domain
    pub domain: ParamDomain,
    /// UI unit hint
    pub unit: Option<UiUnit>,
    /// UI axis hint
    pub axis: Option<UiAxis>,
}

impl ParamSpec {
    fn new(name: impl Into<String>, title: impl Into<String>, ty: ParamType, default: ParamDefault) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            description: String::new(),
            ty,
            default,
            domain: ParamDomain::Any,
            unit: None,
            axis: None,
        }
    }

    /// Declare a double parameter
    pub fn double(name: impl Into<String>, title: impl Into<String>, default: f64) -> Self {
        Self::new(name, title, ParamType::Double, ParamDefault::Value(ParamValue::Double(default)))
    }

    /// Declare an integer parameter
    pub fn int(name: impl Into<String>, title: impl Into<String>, default: i32) -> Self {
        Self::new(name, title, ParamType::Int, ParamDefault::Value(ParamValue::Int(default)))
    }

    /// Declare a color parameter
    pub fn color(name: impl Into<String>, title: impl Into<String>, default: Rgba) -> Self {
        Self::new(name, title, ParamType::Color, ParamDefault::Value(ParamValue::Color(default)))
    }

    /// Declare a seed parameter with a randomized default
    pub fn seed(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(name, title, ParamType::Seed, ParamDefault::RandomSeed)
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the valid range
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.domain = ParamDomain::Range { min, max };
        self
    }

    /// Set the UI unit hint
    pub fn with_unit(mut self, unit: UiUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Set the UI axis hint
    pub fn with_axis(mut self, axis: UiAxis) -> Self {
        self.axis = Some(axis);
        self
    }

    /// Produce the initial value for a fresh instance.
    ///
    /// Declared defaults are conformed to the declared domain, so an
    /// instance never starts out of range.
    pub fn instantiate(&self) -> ParamValue {
        match &self.default {
            ParamDefault::Value(v) => self.conform(v.clone()).unwrap_or_else(|_| v.clone()),
            ParamDefault::RandomSeed => ParamValue::Seed(rand::random()),
        }
    }

    /// Validate a value against this declaration.
    ///
    /// Numeric input is clamped into the declared range and coerced between
    /// `Int` and `Double` as the declared type requires. Out-of-domain input
    /// is never an error. A value of the wrong semantic type is.
    pub fn conform(&self, value: ParamValue) -> Result<ParamValue, ParamError> {
        match (self.ty, value) {
            (ParamType::Double, ParamValue::Double(v)) => Ok(ParamValue::Double(self.domain.clamp(v))),
            (ParamType::Double, ParamValue::Int(v)) => {
                Ok(ParamValue::Double(self.domain.clamp(f64::from(v))))
            }
            (ParamType::Int, ParamValue::Int(v)) => {
                Ok(ParamValue::Int(self.domain.clamp(f64::from(v)).round() as i32))
            }
            (ParamType::Int, ParamValue::Double(v)) => {
                Ok(ParamValue::Int(self.domain.clamp(v).round() as i32))
            }
            (ParamType::Color, ParamValue::Color(c)) => Ok(ParamValue::Color(c)),
            (ParamType::Seed, ParamValue::Seed(s)) => Ok(ParamValue::Seed(s)),
            (ParamType::Seed, ParamValue::Int(v)) if v >= 0 => Ok(ParamValue::Seed(v as u32)),
            (expected, got) => Err(ParamError::TypeMismatch {
                name: self.name.clone(),
                expected,
                got: got.param_type(),
            }),
        }
    }
}

/// Error in parameter declaration or assignment
#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    /// Parameter name is not declared
    #[error("unknown parameter: {0}")]
    Unknown(String),

    /// Value has the wrong semantic type
    #[error("parameter {name} expects {expected:?}, got {got:?}")]
    TypeMismatch {
        /// Parameter name
        name: String,
        /// Declared type
        expected: ParamType,
        /// Supplied type
        got: ParamType,
    },

    /// Color string is not valid hex
    #[error("malformed color: {0}")]
    MalformedColor(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_into_range() {
        let spec = ParamSpec::int("amount_x", "Horizontal spread", 20).with_range(15.0, 60.0);
        assert_eq!(spec.conform(ParamValue::Int(5)).unwrap(), ParamValue::Int(15));
        assert_eq!(spec.conform(ParamValue::Int(90)).unwrap(), ParamValue::Int(60));
        assert_eq!(spec.conform(ParamValue::Int(33)).unwrap(), ParamValue::Int(33));
    }

    #[test]
    fn test_numeric_coercion() {
        let spec = ParamSpec::double("tilesize", "Tile size", 1.7).with_range(1.5, 2.0);
        assert_eq!(spec.conform(ParamValue::Int(1)).unwrap(), ParamValue::Double(1.5));

        let spec = ParamSpec::int("amount_y", "Vertical spread", 20).with_range(15.0, 60.0);
        assert_eq!(spec.conform(ParamValue::Double(29.6)).unwrap(), ParamValue::Int(30));
    }

    #[test]
    fn test_default_conformed_at_instantiation() {
        let spec = ParamSpec::double("strength", "Strength", 0.9).with_range(0.25, 0.75);
        assert_eq!(spec.instantiate(), ParamValue::Double(0.75));
    }

    #[test]
    fn test_type_mismatch() {
        let spec = ParamSpec::color("value", "Color", Rgba::WHITE);
        let err = spec.conform(ParamValue::Double(1.0)).unwrap_err();
        assert!(matches!(err, ParamError::TypeMismatch { .. }));
    }

    #[test]
    fn test_seed_instantiation() {
        let spec = ParamSpec::seed("seed", "Random seed");
        assert!(matches!(spec.instantiate(), ParamValue::Seed(_)));
        // Non-negative ints are accepted as seeds
        assert_eq!(spec.conform(ParamValue::Int(7)).unwrap(), ParamValue::Seed(7));
    }

    #[test]
    fn test_hex_colors() {
        let c = Rgba::from_hex("#00f9ff").unwrap();
        assert_eq!(c.to_hex(), "#00f9ff");
        assert_eq!(Rgba::WHITE.to_hex(), "#ffffff");
        assert_eq!(Rgba::TRANSPARENT.to_hex(), "#00000000");
        assert!(Rgba::from_hex("#zzz").is_err());
    }

    #[test]
    fn test_color_serialization() {
        let json = serde_json::to_string(&Rgba::WHITE).unwrap();
        assert_eq!(json, "\"#ffffff\"");
        let back: Rgba = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgba::WHITE);
    }
}
