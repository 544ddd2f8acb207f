use std::collections::BTreeMap;

use vn_core::{VnError, VnValue};

use crate::node::NodeId;
use crate::scry::Scry;

#[derive(Debug, Clone, PartialEq)]
pub struct SayRequest {
    pub who: Option<VnValue>,
    pub what: String,
    pub interact: bool,
    pub args: Vec<VnValue>,
    pub kwargs: BTreeMap<String, VnValue>,
    pub attributes: Option<Vec<String>>,
    pub temporary_attributes: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceItem {
    pub caption: String,
    /// Position of the item in the menu statement, absent for captions.
    pub item: Option<usize>,
    pub args: Vec<VnValue>,
    pub kwargs: BTreeMap<String, VnValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuRequest {
    pub items: Vec<ChoiceItem>,
    pub args: Vec<VnValue>,
    pub kwargs: BTreeMap<String, VnValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowRequest {
    pub name: Vec<String>,
    pub tag: Option<String>,
    pub layer: String,
    pub at_list: Vec<VnValue>,
    pub what: Option<VnValue>,
    pub zorder: Option<VnValue>,
    pub behind: Vec<String>,
}

/// Presentation layer the session drives. Only dialogue and menus need an
/// answer from the host; display operations default to no-ops.
pub trait Interface {
    fn say(&mut self, request: &SayRequest) -> Result<(), VnError>;

    /// Returns the index into `request.items` the player picked, or `None`
    /// to leave the menu without a choice.
    fn choose(&mut self, request: &MenuRequest) -> Result<Option<usize>, VnError>;

    fn show(&mut self, _request: &ShowRequest) -> Result<(), VnError> {
        Ok(())
    }

    fn hide(&mut self, _tag: &str, _layer: &str) -> Result<(), VnError> {
        Ok(())
    }

    fn scene(&mut self, _layer: &str) -> Result<(), VnError> {
        Ok(())
    }

    fn layer_at_list(
        &mut self,
        _layer: &str,
        _at_list: &[VnValue],
        _camera: bool,
    ) -> Result<(), VnError> {
        Ok(())
    }

    fn with_statement(
        &mut self,
        _transition: &VnValue,
        _paired: Option<&VnValue>,
    ) -> Result<(), VnError> {
        Ok(())
    }

    /// Transition requested by a `with` clause on dialogue or menus.
    fn set_transition(&mut self, _transition: &VnValue) -> Result<(), VnError> {
        Ok(())
    }

    fn image(&mut self, _name: &[String], _value: &VnValue) -> Result<(), VnError> {
        Ok(())
    }

    fn showing(&self, _tag: &str, _layer: &str) -> bool {
        false
    }

    /// Lets the speaker refine a scry of an upcoming line, e.g. to report
    /// that it extends the current one.
    fn scry_say(&self, _who: Option<&VnValue>, _scry: &mut Scry) {}
}

/// Interface that prints nothing and always takes the first choice.
#[derive(Debug, Clone, Default)]
pub struct HeadlessInterface {
    pub lines: Vec<String>,
}

impl Interface for HeadlessInterface {
    fn say(&mut self, request: &SayRequest) -> Result<(), VnError> {
        self.lines.push(request.what.clone());
        Ok(())
    }

    fn choose(&mut self, request: &MenuRequest) -> Result<Option<usize>, VnError> {
        Ok(if request.items.is_empty() { None } else { Some(0) })
    }
}

/// Assets a predicted statement would need, gathered for preloading.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictedAsset {
    Image { name: Vec<String>, layer: String },
    Hide { tag: String, layer: String },
    Scene { layer: String },
    Say { who: Option<VnValue>, what: String },
    Menu { captions: Vec<String> },
    Transition(VnValue),
    Custom(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionCache {
    pub assets: Vec<PredictedAsset>,
    pub nodes: Vec<NodeId>,
}

impl PredictionCache {
    pub fn push(&mut self, asset: PredictedAsset) {
        if !self.assets.contains(&asset) {
            self.assets.push(asset);
        }
    }

    pub fn images(&self) -> impl Iterator<Item = &Vec<String>> {
        self.assets.iter().filter_map(|asset| match asset {
            PredictedAsset::Image { name, .. } => Some(name),
            _ => None,
        })
    }
}
