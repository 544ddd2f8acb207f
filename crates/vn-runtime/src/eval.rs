use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use rhai::{Dynamic, Engine, EvalAltResult, Position, Scope, INT};
use vn_core::{VnError, VnValue};

use crate::helpers::rhai_bridge::{dynamic_to_value, is_rhai_identifier, value_to_dynamic};
use crate::helpers::rng::next_random_bounded;
use crate::namespace::{Stores, DEFAULT_STORE};

/// The expression/code evaluator behind conditions, `python` blocks and
/// every other piece of embedded code.
pub trait Evaluator {
    fn evaluate(&self, source: &str, store: &str, stores: &mut Stores)
        -> Result<VnValue, VnError>;

    /// Runs a code block. With `hide`, variables it introduces stay local.
    fn exec(&self, source: &str, store: &str, hide: bool, stores: &mut Stores)
        -> Result<(), VnError>;
}

/// Rhai-backed evaluator. The global store is always visible; a named
/// store shadows it for the duration of one evaluation.
pub struct RhaiEvaluator {
    engine: Engine,
    rng_state: Rc<RefCell<u32>>,
}

impl Default for RhaiEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl RhaiEvaluator {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_strict_variables(true);

        let rng_state = Rc::new(RefCell::new(1u32));
        let rng_state_clone = Rc::clone(&rng_state);
        engine.register_fn(
            "random",
            move |bound: INT| -> Result<INT, Box<EvalAltResult>> {
                let bound = match u32::try_from(bound) {
                    Ok(bound) if bound > 0 => bound,
                    _ => {
                        return Err(Box::new(EvalAltResult::ErrorRuntime(
                            Dynamic::from(format!(
                                "random(n) expects an integer n in 1..={}.",
                                u32::MAX
                            )),
                            Position::NONE,
                        )));
                    }
                };
                let mut state = rng_state_clone.borrow_mut();
                Ok(INT::from(next_random_bounded(&mut state, bound)))
            },
        );

        Self { engine, rng_state }
    }

    fn run(
        &self,
        source: &str,
        store: &str,
        hide: bool,
        is_expression: bool,
        stores: &mut Stores,
    ) -> Result<VnValue, VnError> {
        let mut layers = vec![DEFAULT_STORE];
        if store != DEFAULT_STORE {
            layers.push(store);
        }

        let mut scope = Scope::new();
        let mut origins: BTreeMap<String, (String, VnValue)> = BTreeMap::new();
        for layer in layers {
            let Some(values) = stores.store(layer) else {
                continue;
            };
            for (name, value) in &values.values {
                if !is_rhai_identifier(name) {
                    continue;
                }
                scope.push_dynamic(name.clone(), value_to_dynamic(value));
                origins.insert(name.clone(), (layer.to_string(), value.clone()));
            }
        }

        *self.rng_state.borrow_mut() = stores.rng_state;
        let result = if is_expression {
            self.engine
                .eval_with_scope::<Dynamic>(&mut scope, &format!("({})", source))
                .map_err(|error| {
                    VnError::evaluation(
                        "EVAL_ERROR",
                        format!("Expression eval failed: {}", error),
                    )
                })
                .and_then(dynamic_to_value)
        } else {
            self.engine
                .run_with_scope(&mut scope, source)
                .map_err(|error| {
                    VnError::evaluation("EVAL_ERROR", format!("Code eval failed: {}", error))
                })
                .map(|_| VnValue::Null)
        };
        stores.rng_state = *self.rng_state.borrow();

        let mut introduced = BTreeMap::new();
        for (name, _constant, value) in scope.iter() {
            introduced.insert(name.to_string(), value);
        }
        for (name, value) in introduced {
            let after = dynamic_to_value(value)?;
            match origins.get(&name) {
                Some((layer, before)) => {
                    if &after != before {
                        stores.set(layer, &name, after);
                    }
                }
                None if !hide => stores.set(store, &name, after),
                None => {}
            }
        }

        result
    }
}

impl Evaluator for RhaiEvaluator {
    fn evaluate(
        &self,
        source: &str,
        store: &str,
        stores: &mut Stores,
    ) -> Result<VnValue, VnError> {
        self.run(source, store, true, true, stores)
    }

    fn exec(
        &self,
        source: &str,
        store: &str,
        hide: bool,
        stores: &mut Stores,
    ) -> Result<(), VnError> {
        self.run(source, store, hide, false, stores).map(|_| ())
    }
}
