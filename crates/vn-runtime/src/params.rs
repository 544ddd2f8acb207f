use std::collections::BTreeMap;

use vn_core::{ArgumentInfo, ParameterInfo, ParameterKind, Unpack, VnError, VnValue};

use crate::context::PendingArguments;
use crate::eval::Evaluator;
use crate::namespace::{Stores, DEFAULT_STORE};

/// Evaluates call-site arguments, expanding `*` and `**` unpacking.
pub fn evaluate_arguments(
    info: &ArgumentInfo,
    evaluator: &dyn Evaluator,
    stores: &mut Stores,
) -> Result<PendingArguments, VnError> {
    let mut out = PendingArguments::default();
    for argument in &info.arguments {
        let value = evaluator.evaluate(&argument.expr, DEFAULT_STORE, stores)?;
        match (argument.unpack, &argument.name) {
            (Unpack::None, Some(name)) => {
                out.kwargs.insert(name.clone(), value);
            }
            (Unpack::None, None) => out.args.push(value),
            (Unpack::Positional, _) => match value {
                VnValue::Array(values) => out.args.extend(values),
                other => {
                    return Err(VnError::evaluation(
                        "ARGUMENT_UNPACK",
                        format!("Cannot unpack {} as positional arguments.", other.type_name()),
                    ))
                }
            },
            (Unpack::Keyword, _) => match value {
                VnValue::Map(values) => out.kwargs.extend(values),
                other => {
                    return Err(VnError::evaluation(
                        "ARGUMENT_UNPACK",
                        format!("Cannot unpack {} as keyword arguments.", other.type_name()),
                    ))
                }
            },
        }
    }
    Ok(out)
}

fn arity_error(message: String) -> VnError {
    VnError::structural("ARGUMENT_ARITY", message)
}

/// Binds pending call arguments to a label's parameters. Defaults are
/// evaluated in declaration order, only for parameters left unbound.
pub fn apply_arguments(
    parameters: Option<&ParameterInfo>,
    pending: Option<PendingArguments>,
    evaluator: &dyn Evaluator,
    stores: &mut Stores,
) -> Result<BTreeMap<String, VnValue>, VnError> {
    let pending = pending.unwrap_or_default();
    let Some(parameters) = parameters else {
        if !pending.args.is_empty() || !pending.kwargs.is_empty() {
            return Err(arity_error(
                "Arguments supplied, but parameter list not present.".to_string(),
            ));
        }
        return Ok(BTreeMap::new());
    };

    let mut bound: BTreeMap<String, VnValue> = BTreeMap::new();
    let mut positional = pending.args.into_iter();
    let mut extra_positional = Vec::new();
    let mut extra_keyword = BTreeMap::new();

    for parameter in &parameters.parameters {
        if matches!(
            parameter.kind,
            ParameterKind::PositionalOnly | ParameterKind::PositionalOrKeyword
        ) {
            if let Some(value) = positional.next() {
                bound.insert(parameter.name.clone(), value);
            }
        }
    }
    extra_positional.extend(positional);

    let var_positional = parameters
        .parameters
        .iter()
        .find(|parameter| parameter.kind == ParameterKind::VarPositional);
    let var_keyword = parameters
        .parameters
        .iter()
        .find(|parameter| parameter.kind == ParameterKind::VarKeyword);

    if !extra_positional.is_empty() && var_positional.is_none() {
        return Err(arity_error(format!(
            "Too many arguments: {} positional arguments were not expected.",
            extra_positional.len()
        )));
    }

    for (name, value) in pending.kwargs {
        let target = parameters.parameters.iter().find(|parameter| {
            parameter.name == name
                && matches!(
                    parameter.kind,
                    ParameterKind::PositionalOrKeyword | ParameterKind::KeywordOnly
                )
        });
        match target {
            Some(_) if bound.contains_key(&name) => {
                return Err(arity_error(format!(
                    "Got multiple values for argument '{}'.",
                    name
                )))
            }
            Some(_) => {
                bound.insert(name, value);
            }
            None if var_keyword.is_some() => {
                extra_keyword.insert(name, value);
            }
            None => {
                return Err(arity_error(format!(
                    "Got an unexpected keyword argument '{}'.",
                    name
                )))
            }
        }
    }

    for parameter in &parameters.parameters {
        match parameter.kind {
            ParameterKind::VarPositional => {
                bound.insert(
                    parameter.name.clone(),
                    VnValue::Array(std::mem::take(&mut extra_positional)),
                );
            }
            ParameterKind::VarKeyword => {
                bound.insert(
                    parameter.name.clone(),
                    VnValue::Map(std::mem::take(&mut extra_keyword)),
                );
            }
            _ if bound.contains_key(&parameter.name) => {}
            _ => match &parameter.default {
                Some(default) => {
                    let value = evaluator.evaluate(default, DEFAULT_STORE, stores)?;
                    bound.insert(parameter.name.clone(), value);
                }
                None => {
                    return Err(arity_error(format!(
                        "Missing a required argument: '{}'.",
                        parameter.name
                    )))
                }
            },
        }
    }

    Ok(bound)
}
