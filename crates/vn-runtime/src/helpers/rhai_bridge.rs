use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use rhai::{Array, Dynamic, ImmutableString, Map, FLOAT, INT};
use vn_core::{VnError, VnValue};

/// Store keys that can be bound as Rhai variables.
pub(crate) fn is_rhai_identifier(name: &str) -> bool {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    name != "_"
        && IDENT
            .get_or_init(|| {
                Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex must compile")
            })
            .is_match(name)
}

pub(crate) fn value_to_dynamic(value: &VnValue) -> Dynamic {
    match value {
        VnValue::Null => Dynamic::UNIT,
        VnValue::Bool(value) => Dynamic::from_bool(*value),
        VnValue::Number(value) => {
            // Integral numbers stay usable as array indices.
            if value.fract() == 0.0 && value.abs() < 9.0e15 {
                Dynamic::from_int(*value as INT)
            } else {
                Dynamic::from_float(*value as FLOAT)
            }
        }
        VnValue::String(value) => Dynamic::from(value.clone()),
        VnValue::Array(values) => {
            Dynamic::from_array(values.iter().map(value_to_dynamic).collect::<Array>())
        }
        VnValue::Map(values) => {
            let mut map = Map::new();
            for (key, value) in values {
                map.insert(key.as_str().into(), value_to_dynamic(value));
            }
            Dynamic::from_map(map)
        }
    }
}

pub(crate) fn dynamic_to_value(value: Dynamic) -> Result<VnValue, VnError> {
    if value.is_unit() {
        return Ok(VnValue::Null);
    }
    if value.is::<bool>() {
        return Ok(VnValue::Bool(value.cast::<bool>()));
    }
    if value.is::<INT>() {
        return Ok(VnValue::Number(value.cast::<INT>() as f64));
    }
    if value.is::<FLOAT>() {
        return Ok(VnValue::Number(value.cast::<FLOAT>()));
    }
    if value.is::<ImmutableString>() {
        return Ok(VnValue::String(value.cast::<ImmutableString>().to_string()));
    }
    if value.is::<char>() {
        return Ok(VnValue::String(value.cast::<char>().to_string()));
    }
    if value.is::<Array>() {
        let array = value.cast::<Array>();
        let mut out = Vec::with_capacity(array.len());
        for item in array {
            out.push(dynamic_to_value(item)?);
        }
        return Ok(VnValue::Array(out));
    }
    if value.is::<Map>() {
        let map = value.cast::<Map>();
        let mut out = BTreeMap::new();
        for (key, value) in map {
            out.insert(key.to_string(), dynamic_to_value(value)?);
        }
        return Ok(VnValue::Map(out));
    }

    Err(VnError::evaluation(
        "EVAL_VALUE_UNSUPPORTED",
        format!("Unsupported Rhai value type {}.", value.type_name()),
    ))
}
