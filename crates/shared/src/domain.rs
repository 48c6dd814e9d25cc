use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a project or of a category within a dimension.
///
/// Numeric strings are folded into the integer form while decoding, so a
/// category referenced as `2020` and another referenced as `"2020"` compare
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        match value.trim().parse::<i64>() {
            Ok(parsed) => Self::Int(parsed),
            Err(_) => Self::Text(value),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Wide(u64),
            Float(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(value) => Ok(Self::Int(value)),
            Raw::Wide(value) => Ok(Self::Text(value.to_string())),
            // `i64::MAX as f64` rounds up to 2^63, hence the strict bound.
            Raw::Float(value)
                if value.fract() == 0.0
                    && value >= i64::MIN as f64
                    && value < i64::MAX as f64 =>
            {
                Ok(Self::Int(value as i64))
            }
            Raw::Float(value) => Ok(Self::Text(value.to_string())),
            Raw::Text(value) => Ok(Self::text(value)),
        }
    }
}

/// Name of a categorical axis, e.g. `years` or `topics`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionKey(pub String);

impl DimensionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DimensionKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: RecordId,
    #[serde(default, deserialize_with = "title_text")]
    pub title: String,
}

/// Titles are text, but some feeds emit year titles as bare numbers or leave
/// them out. Matching only ever looks at ids.
fn title_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(value) => value,
        Raw::Number(value) => value.to_string(),
        Raw::Null(()) => String::new(),
    })
}

impl CategoryRef {
    pub fn new(id: impl Into<RecordId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }

    /// Two references name the same category when their ids match; titles are
    /// display-only.
    pub fn same_category(&self, other: &CategoryRef) -> bool {
        self.id == other.id
    }
}

/// Value of one project attribute, normalized once while decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Many(Vec<CategoryRef>),
    One(CategoryRef),
    Other(serde_json::Value),
}

impl AttributeValue {
    /// Category view of the value: a scalar reference is a singleton, a list
    /// is itself, anything else holds no categories.
    pub fn categories(&self) -> &[CategoryRef] {
        match self {
            Self::Many(list) => list,
            Self::One(single) => std::slice::from_ref(single),
            Self::Other(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: RecordId,
    #[serde(default, deserialize_with = "title_text")]
    pub title: String,
    /// Remaining fields in record order.
    #[serde(flatten)]
    pub attributes: IndexMap<String, AttributeValue>,
}

impl Project {
    pub fn new(id: impl Into<RecordId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            attributes: IndexMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Categories the project holds on `key`; empty when the attribute is
    /// missing, so such a project matches no cell on that axis.
    pub fn categories(&self, key: &DimensionKey) -> &[CategoryRef] {
        self.attributes
            .get(key.as_str())
            .map(AttributeValue::categories)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
