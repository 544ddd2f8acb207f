use vn_core::VnValue;

use crate::node::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub enum ExtendText {
    /// The next line is not an `extend` of the current one.
    DoesNotExtend,
    Text(String),
}

/// A cheap look at what the statement after the current one will do.
/// `None` fields mean "unknown".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scry {
    pub next: Option<NodeId>,
    pub interacts: Option<bool>,
    pub say: Option<bool>,
    pub menu_with_caption: Option<bool>,
    pub who: Option<VnValue>,
    pub extend_text: Option<ExtendText>,
    pub multiple: Option<i64>,
}

impl Scry {
    pub fn after(next: Option<NodeId>) -> Self {
        Self {
            next,
            ..Self::default()
        }
    }
}
