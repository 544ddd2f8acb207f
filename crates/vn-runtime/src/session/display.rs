use super::*;
use crate::interface::{PredictedAsset, PredictionCache, ShowRequest};
use vn_core::ImageSpec;

impl Session {
    fn evaluate_at_list(&mut self, at_list: &[String]) -> Result<Vec<VnValue>, VnError> {
        at_list
            .iter()
            .map(|expression| self.evaluate(expression))
            .collect()
    }

    /// Tag for `show expression` without an explicit `as`: the first
    /// `_show_expression_N` not already on screen.
    fn free_expression_tag(&self, layer: Option<&str>) -> String {
        let mut counter = 0usize;
        loop {
            let tag = format!("_show_expression_{}", counter);
            let layer = self.config.layer_for(layer, &tag);
            if !self.interface.showing(&tag, &layer) {
                return tag;
            }
            counter += 1;
        }
    }

    pub(super) fn show_imspec(&mut self, imspec: &ImageSpec) -> Result<(), VnError> {
        let zorder = match &imspec.zorder {
            Some(expression) => Some(self.evaluate(expression)?),
            None => None,
        };

        let (name, what, tag) = match &imspec.expression {
            Some(expression) => {
                let value = self.evaluate(expression)?;
                let tag = match &imspec.tag {
                    Some(tag) => tag.clone(),
                    None => self.free_expression_tag(imspec.layer.as_deref()),
                };
                (vec![tag.clone()], Some(value), Some(tag))
            }
            None => (imspec.name.clone(), None, imspec.tag.clone()),
        };

        let at_list = self.evaluate_at_list(&imspec.at_list)?;
        let key = tag
            .clone()
            .or_else(|| name.first().cloned())
            .unwrap_or_default();
        let layer = self.config.layer_for(imspec.layer.as_deref(), &key);
        self.interface.show(&ShowRequest {
            name,
            tag,
            layer,
            at_list,
            what,
            zorder,
            behind: imspec.behind.clone(),
        })
    }

    pub(super) fn execute_image(
        &mut self,
        node: &Node,
        name: &[String],
        expression: &str,
    ) -> Result<(), VnError> {
        self.context.next_node = node.next;
        self.statement_name("image");
        let value = self.evaluate(expression)?;
        self.interface.image(name, &value)
    }

    pub(super) fn execute_scene(
        &mut self,
        node: &Node,
        imspec: Option<&ImageSpec>,
        layer: &str,
    ) -> Result<(), VnError> {
        self.context.next_node = node.next;
        self.statement_name("scene");
        self.interface.scene(layer)?;
        match imspec {
            Some(imspec) => self.show_imspec(imspec),
            None => Ok(()),
        }
    }

    pub(super) fn execute_hide(&mut self, node: &Node, imspec: &ImageSpec) -> Result<(), VnError> {
        self.context.next_node = node.next;
        self.statement_name("hide");
        let tag = imspec
            .tag
            .clone()
            .or_else(|| imspec.name.first().cloned())
            .unwrap_or_default();
        let layer = self.config.layer_for(imspec.layer.as_deref(), &tag);
        self.interface.hide(&tag, &layer)
    }

    pub(super) fn execute_layer_at_list(
        &mut self,
        node: &Node,
        layer: &str,
        at_list: &[String],
        camera: bool,
    ) -> Result<(), VnError> {
        self.context.next_node = node.next;
        self.statement_name(if camera { "camera" } else { "show layer" });
        let at_list = self.evaluate_at_list(at_list)?;
        self.interface.layer_at_list(layer, &at_list, camera)
    }

    pub(super) fn execute_with(
        &mut self,
        node: &Node,
        expression: &str,
        paired: Option<&str>,
    ) -> Result<(), VnError> {
        self.context.next_node = node.next;
        self.statement_name("with");
        let transition = self.evaluate(expression)?;
        let paired = match paired {
            Some(paired) => Some(self.evaluate(paired)?),
            None => None,
        };
        self.interface.with_statement(&transition, paired.as_ref())
    }

    pub(super) fn predict_imspec(&self, imspec: &ImageSpec, cache: &mut PredictionCache) {
        let name = match &imspec.expression {
            Some(expression) => match self.speculate(expression) {
                Some(VnValue::String(image)) => vec![image],
                _ => return,
            },
            None => imspec.name.clone(),
        };
        let key = imspec
            .tag
            .clone()
            .or_else(|| name.first().cloned())
            .unwrap_or_default();
        let layer = self.config.layer_for(imspec.layer.as_deref(), &key);
        cache.push(PredictedAsset::Image { name, layer });
    }

    pub(super) fn predict_display(&self, kind: &NodeKind, cache: &mut PredictionCache) {
        match kind {
            NodeKind::Show { imspec } => self.predict_imspec(imspec, cache),
            NodeKind::Scene { imspec, layer } => {
                cache.push(PredictedAsset::Scene {
                    layer: layer.clone(),
                });
                if let Some(imspec) = imspec {
                    self.predict_imspec(imspec, cache);
                }
            }
            NodeKind::Hide { imspec } => {
                let tag = imspec
                    .tag
                    .clone()
                    .or_else(|| imspec.name.first().cloned())
                    .unwrap_or_default();
                let layer = self.config.layer_for(imspec.layer.as_deref(), &tag);
                cache.push(PredictedAsset::Hide { tag, layer });
            }
            NodeKind::With { expr, .. } => {
                if let Some(transition) = self.speculate(expr) {
                    cache.push(PredictedAsset::Transition(transition));
                }
            }
            _ => {}
        }
    }
}
