use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::VnError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VnValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<VnValue>),
    Map(BTreeMap<String, VnValue>),
}

impl VnValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, VnValue>> {
        match self {
            Self::Map(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    /// Truthiness used for conditions: empty containers, zero, empty
    /// strings and null are false.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => *value,
            Self::Number(value) => *value != 0.0,
            Self::String(value) => !value.is_empty(),
            Self::Array(values) => !values.is_empty(),
            Self::Map(values) => !values.is_empty(),
        }
    }

    /// `old += value` as performed by augmented `define` statements.
    pub fn add(&self, other: &VnValue) -> Result<VnValue, VnError> {
        match (self, other) {
            (Self::Number(left), Self::Number(right)) => Ok(Self::Number(left + right)),
            (Self::String(left), Self::String(right)) => Ok(Self::String(format!("{left}{right}"))),
            (Self::Array(left), Self::Array(right)) => {
                let mut out = left.clone();
                out.extend(right.iter().cloned());
                Ok(Self::Array(out))
            }
            _ => Err(VnError::evaluation(
                "VALUE_ADD",
                format!("Cannot add {} to {}.", other.type_name(), self.type_name()),
            )),
        }
    }

    /// `old |= value`: map merge, set-like array union, or boolean or.
    pub fn union(&self, other: &VnValue) -> Result<VnValue, VnError> {
        match (self, other) {
            (Self::Bool(left), Self::Bool(right)) => Ok(Self::Bool(*left || *right)),
            (Self::Map(left), Self::Map(right)) => {
                let mut out = left.clone();
                out.extend(right.iter().map(|(key, value)| (key.clone(), value.clone())));
                Ok(Self::Map(out))
            }
            (Self::Array(left), Self::Array(right)) => {
                let mut out = left.clone();
                for value in right {
                    if !out.contains(value) {
                        out.push(value.clone());
                    }
                }
                Ok(Self::Array(out))
            }
            _ => Err(VnError::evaluation(
                "VALUE_UNION",
                format!("Cannot union {} into {}.", other.type_name(), self.type_name()),
            )),
        }
    }

    /// `self[key] = value` for maps (string keys) and arrays (number keys).
    pub fn set_index(&mut self, key: &VnValue, value: VnValue) -> Result<(), VnError> {
        match (self, key) {
            (Self::Map(entries), Self::String(key)) => {
                entries.insert(key.clone(), value);
                Ok(())
            }
            (Self::Array(entries), Self::Number(index)) => {
                let slot = array_position(entries.len(), *index)
                    .and_then(|position| entries.get_mut(position))
                    .ok_or_else(|| {
                        VnError::evaluation(
                            "VALUE_INDEX",
                            format!("Index {} is out of range.", index),
                        )
                    })?;
                *slot = value;
                Ok(())
            }
            (target, key) => Err(VnError::evaluation(
                "VALUE_INDEX",
                format!(
                    "Cannot index {} with {}.",
                    target.type_name(),
                    key.type_name()
                ),
            )),
        }
    }

    pub fn get_index(&self, key: &VnValue) -> Result<VnValue, VnError> {
        let found = match (self, key) {
            (Self::Map(entries), Self::String(key)) => entries.get(key).cloned(),
            (Self::Array(entries), Self::Number(index)) => array_position(entries.len(), *index)
                .and_then(|position| entries.get(position))
                .cloned(),
            _ => None,
        };
        found.ok_or_else(|| {
            VnError::evaluation(
                "VALUE_INDEX",
                format!("Cannot read index from {}.", self.type_name()),
            )
        })
    }
}

/// Whole-number index into an array of `len` items; negatives count from the end.
fn array_position(len: usize, index: f64) -> Option<usize> {
    if !index.is_finite() || index.fract() != 0.0 {
        return None;
    }
    let position = if index < 0.0 { len as f64 + index } else { index };
    if position < 0.0 || position >= len as f64 {
        return None;
    }
    Some(position as usize)
}

pub fn value_to_text(value: &VnValue) -> String {
    match value {
        VnValue::Null => "None".to_string(),
        VnValue::Bool(value) => value.to_string(),
        VnValue::Number(value) => {
            if value.fract().abs() < f64::EPSILON {
                (*value as i64).to_string()
            } else {
                value.to_string()
            }
        }
        VnValue::String(value) => value.clone(),
        VnValue::Array(_) | VnValue::Map(_) => format!("{:?}", value),
    }
}
