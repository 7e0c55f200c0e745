//! Dynamic property values
//!
//! Materials, post-processes, 2D containers and animation keys carry
//! loosely-typed parameters. Values serialize as plain JSON so codec
//! output stays readable in a diff.

use serde::{Deserialize, Serialize};

/// A dynamic value for an engine property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Null/None value
    Null,
    /// Boolean value
    Bool(bool),
    /// Scalar value
    Number(f64),
    /// String value
    Text(String),
    /// 3D vector or RGB color
    Vec3([f64; 3]),
    /// 4D vector, quaternion or RGBA color
    Vec4([f64; 4]),
    /// Array of values
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as f64
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as vec3
    pub fn as_vec3(&self) -> Option<[f64; 3]> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }
}

impl Default for PropertyValue {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<[f32; 3]> for PropertyValue {
    fn from(v: [f32; 3]) -> Self {
        Self::Vec3([v[0] as f64, v[1] as f64, v[2] as f64])
    }
}

impl From<[f32; 4]> for PropertyValue {
    fn from(v: [f32; 4]) -> Self {
        Self::Vec4([v[0] as f64, v[1] as f64, v[2] as f64, v[3] as f64])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_json_shapes() {
        let color: PropertyValue = serde_json::from_str("[1.0, 0.5, 0.25]").unwrap();
        assert_eq!(color.as_vec3(), Some([1.0, 0.5, 0.25]));

        let alpha: PropertyValue = serde_json::from_str("0.5").unwrap();
        assert_eq!(alpha.as_number(), Some(0.5));

        let flag: PropertyValue = serde_json::from_str("true").unwrap();
        assert_eq!(flag.as_bool(), Some(true));

        let text = serde_json::to_string(&PropertyValue::from("lambert")).unwrap();
        assert_eq!(text, "\"lambert\"");
    }
}
