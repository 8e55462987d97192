//! Named style properties
//!
//! Themes address component attributes by name (`collapsed-size`,
//! `icon-size`, ...). Components implement [`Stylable`] to map those names
//! onto their setters; values can change at any time and the component
//! re-derives its visuals on the next layout or paint.

use thiserror::Error;
use tracing::warn;

/// Style property errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleError {
    #[error("unknown style property '{property}'")]
    UnknownProperty { property: String },

    #[error("invalid value for style property '{property}': expected {expected}")]
    InvalidValue {
        property: String,
        expected: &'static str,
    },
}

/// A parsed style value
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    Float(f32),
    Int(i64),
    Bool(bool),
    Str(String),
}

impl StyleValue {
    /// Parse a raw stylesheet value; a trailing `px` is ignored
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            "true" => return StyleValue::Bool(true),
            "false" => return StyleValue::Bool(false),
            _ => {}
        }

        let number = raw.strip_suffix("px").unwrap_or(raw).trim();
        if let Ok(i) = number.parse::<i64>() {
            return StyleValue::Int(i);
        }
        if let Ok(f) = number.parse::<f32>() {
            return StyleValue::Float(f);
        }
        StyleValue::Str(raw.trim_matches('"').to_string())
    }

    pub fn as_f32(&self, property: &str) -> Result<f32, StyleError> {
        match self {
            StyleValue::Float(f) => Ok(*f),
            StyleValue::Int(i) => Ok(*i as f32),
            _ => Err(invalid(property, "a number")),
        }
    }

    /// Non-negative number
    pub fn as_length(&self, property: &str) -> Result<f32, StyleError> {
        let v = self.as_f32(property)?;
        if v < 0.0 || !v.is_finite() {
            return Err(invalid(property, "a non-negative length"));
        }
        Ok(v)
    }

    /// Number in `[0, 1]`
    pub fn as_fraction(&self, property: &str) -> Result<f32, StyleError> {
        let v = self.as_f32(property)?;
        if !(0.0..=1.0).contains(&v) {
            return Err(invalid(property, "a fraction between 0 and 1"));
        }
        Ok(v)
    }

    pub fn as_u32(&self, property: &str) -> Result<u32, StyleError> {
        match self {
            StyleValue::Int(i) if *i >= 0 => u32::try_from(*i).map_err(|_| invalid(property, "an unsigned integer")),
            _ => Err(invalid(property, "an unsigned integer")),
        }
    }

    pub fn as_bool(&self, property: &str) -> Result<bool, StyleError> {
        match self {
            StyleValue::Bool(b) => Ok(*b),
            _ => Err(invalid(property, "true or false")),
        }
    }

    pub fn as_str(&self, property: &str) -> Result<&str, StyleError> {
        match self {
            StyleValue::Str(s) => Ok(s),
            _ => Err(invalid(property, "a name")),
        }
    }
}

pub(crate) fn invalid(property: &str, expected: &'static str) -> StyleError {
    StyleError::InvalidValue {
        property: property.to_string(),
        expected,
    }
}

pub(crate) fn unknown(property: &str) -> StyleError {
    StyleError::UnknownProperty {
        property: property.to_string(),
    }
}

/// Component with theme-settable properties
pub trait Stylable {
    /// Names accepted by [`Stylable::set_style_property`]
    fn style_properties(&self) -> &'static [&'static str];

    fn set_style_property(&mut self, name: &str, value: &StyleValue) -> Result<(), StyleError>;

    /// Apply a batch of raw `name: value` pairs, logging and skipping bad ones
    fn apply_style(&mut self, properties: &[(&str, &str)]) -> usize {
        let mut applied = 0;
        for (name, raw) in properties {
            match self.set_style_property(name, &StyleValue::parse(raw)) {
                Ok(()) => applied += 1,
                Err(e) => warn!("Ignoring style property: {}", e),
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_values() {
        assert_eq!(StyleValue::parse("true"), StyleValue::Bool(true));
        assert_eq!(StyleValue::parse("12px"), StyleValue::Int(12));
        assert_eq!(StyleValue::parse(" 0.5 "), StyleValue::Float(0.5));
        assert_eq!(StyleValue::parse("\"north-east\""), StyleValue::Str("north-east".into()));
    }

    #[test]
    fn test_typed_accessors() {
        assert_eq!(StyleValue::Int(3).as_f32("x"), Ok(3.0));
        assert!(StyleValue::Float(-1.0).as_length("spacing").is_err());
        assert!(StyleValue::Float(1.5).as_fraction("x-align").is_err());
        assert_eq!(StyleValue::Int(16).as_u32("icon-size"), Ok(16));
        assert!(StyleValue::Int(-16).as_u32("icon-size").is_err());
        assert_eq!(
            StyleValue::Str("a".into()).as_bool("flag"),
            Err(StyleError::InvalidValue {
                property: "flag".into(),
                expected: "true or false"
            })
        );
    }
}
