use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vn_core::{NodeName, VnValue};

use crate::namespace::{Stores, DEFAULT_STORE};
use crate::node::NodeId;

/// Previous values of dynamically scoped globals; `None` means the
/// variable did not exist before.
pub type DynamicFrame = BTreeMap<String, Option<VnValue>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnFrame {
    pub return_site: Option<NodeName>,
    pub dynamic: DynamicFrame,
}

/// Arguments evaluated by `call`, waiting for the target label to bind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingArguments {
    pub args: Vec<VnValue>,
    pub kwargs: BTreeMap<String, VnValue>,
}

/// Where execution is, where it goes next, and how to get back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
    pub current: Option<NodeId>,
    pub next_node: Option<NodeId>,
    pub return_stack: Vec<ReturnFrame>,
    pub base_dynamic: DynamicFrame,
    pub abnormal: bool,
    pub last_abnormal: bool,
    pub translate_identifier: Option<String>,
    pub alternate: Option<String>,
    pub pending_arguments: Option<PendingArguments>,
    pub init_phase: bool,
    pub say_attributes: Option<Vec<String>>,
    pub temporary_attributes: Option<Vec<String>>,
}

impl ExecutionContext {
    pub fn begin_statement(&mut self) {
        self.last_abnormal = self.abnormal;
        self.abnormal = false;
        self.next_node = None;
    }

    pub fn call(&mut self, return_site: Option<NodeName>) {
        self.return_stack.push(ReturnFrame {
            return_site,
            dynamic: DynamicFrame::new(),
        });
    }

    pub fn pop_return(&mut self) -> Option<ReturnFrame> {
        self.return_stack.pop()
    }

    pub fn predict_return(&self) -> Option<&NodeName> {
        self.return_stack
            .last()
            .and_then(|frame| frame.return_site.as_ref())
    }

    pub fn call_depth(&self) -> usize {
        self.return_stack.len()
    }

    /// Binds `name` in the global store for the current call level,
    /// remembering what it held so the matching return can restore it.
    pub fn dynamic(&mut self, stores: &mut Stores, name: &str, value: VnValue) {
        let frame = match self.return_stack.last_mut() {
            Some(frame) => &mut frame.dynamic,
            None => &mut self.base_dynamic,
        };
        if !frame.contains_key(name) {
            frame.insert(name.to_string(), stores.get(DEFAULT_STORE, name).ok());
        }
        stores.set(DEFAULT_STORE, name, value);
    }

    pub fn restore_dynamic(frame: DynamicFrame, stores: &mut Stores) {
        for (name, previous) in frame {
            match previous {
                Some(value) => stores.set(DEFAULT_STORE, &name, value),
                None => {
                    stores.remove(DEFAULT_STORE, &name);
                }
            }
        }
    }
}
