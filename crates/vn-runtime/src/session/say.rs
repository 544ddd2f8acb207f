use super::*;
use crate::context::PendingArguments;
use crate::interface::{ChoiceItem, MenuRequest, SayRequest};
use crate::node::{is_simple_word, MenuChoice, SayNode};
use crate::params::evaluate_arguments;
use vn_core::ArgumentInfo;

const CHARACTER_STORE: &str = "store.character";

impl Session {
    /// Resolves the speaker. Bare names are read from the character store,
    /// then the global store; anything else is evaluated.
    pub(super) fn eval_who(
        &mut self,
        who: Option<&str>,
        fast: bool,
    ) -> Result<Option<VnValue>, VnError> {
        let Some(who) = who else {
            return Ok(None);
        };
        if fast {
            if let Ok(value) = self.stores.get(CHARACTER_STORE, who) {
                return Ok(Some(value));
            }
            return self.stores.get(DEFAULT_STORE, who).map(Some).map_err(|_| {
                VnError::evaluation(
                    "SAY_WHO_UNDEFINED",
                    format!("Sayer '{}' is not defined.", who),
                )
            });
        }
        self.evaluate(who).map(Some)
    }

    fn evaluate_optional_arguments(
        &mut self,
        arguments: Option<&ArgumentInfo>,
    ) -> Result<PendingArguments, VnError> {
        match arguments {
            Some(info) => evaluate_arguments(info, self.evaluator.as_ref(), &mut self.stores),
            None => Ok(PendingArguments::default()),
        }
    }

    /// Applies a `with` clause attached to dialogue or a menu.
    fn say_menu_with(&mut self, with_: Option<&str>) -> Result<(), VnError> {
        let Some(expression) = with_ else {
            return Ok(());
        };
        let transition = self.evaluate(expression)?;
        if !transition.is_null() {
            self.interface.set_transition(&transition)?;
        }
        Ok(())
    }

    pub(super) fn execute_say(&mut self, say: &SayNode) -> Result<(), VnError> {
        self.context.say_attributes = say.attributes.clone();
        self.context.temporary_attributes = say.temporary_attributes.clone();
        let result = self.say_line(say);
        self.context.say_attributes = None;
        self.context.temporary_attributes = None;
        self.stores
            .set(DEFAULT_STORE, "_last_raw_what", VnValue::String(String::new()));
        result
    }

    fn say_line(&mut self, say: &SayNode) -> Result<(), VnError> {
        let who = self.eval_who(say.who.as_deref(), say.who_fast)?;

        let statement_name = who
            .as_ref()
            .and_then(VnValue::as_map)
            .and_then(|character| character.get("statement_name"))
            .and_then(VnValue::as_string)
            .map(str::to_string);
        if let Some(name) = statement_name {
            self.statement_name(&name);
        }

        if let Some(speaker) = &who {
            if !matches!(speaker, VnValue::String(_) | VnValue::Map(_)) {
                return Err(VnError::evaluation(
                    "SAY_WHO_TYPE",
                    format!(
                        "Sayer {} is not a character or string.",
                        say.who.as_deref().unwrap_or_default()
                    ),
                ));
            }
        }

        let what = self.substitute(&say.what)?;
        self.stores
            .set(DEFAULT_STORE, "_last_raw_what", VnValue::String(say.what.clone()));

        let mut arguments = self.evaluate_optional_arguments(say.arguments.as_ref())?;
        let interact = match arguments.kwargs.remove("interact") {
            Some(value) => value.truthy() && say.interact,
            None => say.interact,
        };

        self.stores.set(
            DEFAULT_STORE,
            "_last_say_who",
            say.who
                .as_ref()
                .map(|who| VnValue::String(who.clone()))
                .unwrap_or_default(),
        );
        self.stores
            .set(DEFAULT_STORE, "_last_say_what", VnValue::String(what.clone()));
        self.stores.set(
            DEFAULT_STORE,
            "_last_say_args",
            VnValue::Array(arguments.args.clone()),
        );
        self.stores.set(
            DEFAULT_STORE,
            "_last_say_kwargs",
            VnValue::Map(arguments.kwargs.clone()),
        );

        self.say_menu_with(say.with_.as_deref())?;
        self.interface.say(&SayRequest {
            who,
            what,
            interact,
            args: arguments.args,
            kwargs: arguments.kwargs,
            attributes: say.attributes.clone(),
            temporary_attributes: say.temporary_attributes.clone(),
        })?;
        if interact {
            self.interacted();
        }
        Ok(())
    }

    /// Replaces `[expr]` spans with evaluated text. `[[` escapes a bracket.
    pub(super) fn substitute(&mut self, text: &str) -> Result<String, VnError> {
        if !text.contains('[') {
            return Ok(text.to_string());
        }
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find('[') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            if let Some(escaped) = after.strip_prefix('[') {
                out.push('[');
                rest = escaped;
                continue;
            }
            let Some(end) = after.find(']') else {
                out.push_str(&rest[start..]);
                return Ok(out);
            };
            let value = self.evaluate(&after[..end])?;
            out.push_str(&vn_core::value_to_text(&value));
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    pub(super) fn execute_menu(
        &mut self,
        node: &Node,
        items: &[MenuChoice],
        set: Option<&str>,
        with_: Option<&str>,
        has_caption: bool,
        arguments: Option<&ArgumentInfo>,
    ) -> Result<(), VnError> {
        self.context.next_node = node.next;

        let menu_arguments = self.evaluate_optional_arguments(arguments)?;
        let nvl = menu_arguments
            .kwargs
            .get("nvl")
            .is_some_and(VnValue::truthy);
        let mut name = if nvl { "menu-nvl" } else { "menu" }.to_string();
        if has_caption {
            name.push_str("-with-caption");
        }
        self.statement_name(&name);

        let language = self.config.language.clone();
        let mut narration = Vec::new();
        let mut candidates = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let caption = self
                .strings
                .translate(language.as_deref(), &item.label)
                .to_string();
            if item.block.is_none() && self.config.narrator_menu && !caption.is_empty() {
                narration.push(caption);
                continue;
            }
            let item_arguments = self.evaluate_optional_arguments(item.arguments.as_ref())?;
            candidates.push((index, caption, item_arguments));
        }

        if !narration.is_empty() {
            self.interface.say(&SayRequest {
                who: None,
                what: narration.join("\n"),
                interact: false,
                args: Vec::new(),
                kwargs: BTreeMap::new(),
                attributes: None,
                temporary_attributes: None,
            })?;
        }

        self.say_menu_with(with_)?;

        let already_chosen = match set {
            Some(set) => match self.evaluate(set)? {
                VnValue::Array(values) => values,
                _ => Vec::new(),
            },
            None => Vec::new(),
        };

        let mut presented = Vec::new();
        for (index, caption, item_arguments) in candidates {
            if already_chosen
                .iter()
                .any(|chosen| chosen.as_string() == Some(caption.as_str()))
            {
                continue;
            }
            if !self.evaluate_truthy(&items[index].condition)? {
                continue;
            }
            let selectable = items[index].block.is_some();
            presented.push(ChoiceItem {
                caption,
                item: selectable.then_some(index),
                args: item_arguments.args,
                kwargs: item_arguments.kwargs,
            });
        }

        let choice = if presented.is_empty() {
            None
        } else {
            self.interface.choose(&MenuRequest {
                items: presented.clone(),
                args: menu_arguments.args,
                kwargs: menu_arguments.kwargs,
            })?
        };
        self.interacted();

        let Some(position) = choice else {
            return Ok(());
        };
        let picked = presented.get(position).ok_or_else(|| {
            VnError::usage(
                "MENU_CHOICE_INDEX",
                format!(
                    "Choice {} is out of range for {} menu items.",
                    position,
                    presented.len()
                ),
            )
        })?;
        let Some(index) = picked.item else {
            return Ok(());
        };

        if let Some(set) = set.filter(|set| is_simple_word(set)) {
            let mut chosen = already_chosen;
            chosen.push(VnValue::String(picked.caption.clone()));
            self.stores
                .set(DEFAULT_STORE, set.trim(), VnValue::Array(chosen));
        }
        if let Some(first) = items[index].block.as_ref().and_then(|block| block.first()) {
            self.context.next_node = Some(*first);
        }
        Ok(())
    }
}
