use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use regex::Regex;
use vn_core::{
    ArgumentInfo, DefineOperator, ImageSpec, NodeName, ParameterInfo, SourceLocation, VnValue,
};

/// Index of a node inside its owning [`crate::Script`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

pub(crate) fn is_simple_word(source: &str) -> bool {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("word regex must compile"))
        .is_match(source.trim())
}

#[derive(Debug, Clone, PartialEq)]
pub struct SayNode {
    pub who: Option<String>,
    /// `who` is a bare identifier and can be read straight from the
    /// character or global store.
    pub who_fast: bool,
    pub what: String,
    pub with_: Option<String>,
    pub interact: bool,
    pub attributes: Option<Vec<String>>,
    pub temporary_attributes: Option<Vec<String>>,
    pub arguments: Option<ArgumentInfo>,
    pub identifier: Option<String>,
}

impl SayNode {
    pub(crate) fn from_statement(say: vn_core::SayStatement) -> Self {
        let who_fast = say.who.as_deref().is_some_and(is_simple_word);
        Self {
            who: say.who,
            who_fast,
            what: say.what,
            with_: say.with_,
            interact: say.interact,
            attributes: say.attributes,
            temporary_attributes: say.temporary_attributes,
            arguments: say.arguments,
            identifier: say.identifier,
        }
    }

    pub fn get_code(&self) -> String {
        let mut parts = Vec::new();
        if let Some(who) = &self.who {
            parts.push(who.clone());
        }
        if let Some(attributes) = &self.attributes {
            parts.extend(attributes.iter().cloned());
        }
        if let Some(temporary) = &self.temporary_attributes {
            parts.push("@".to_string());
            parts.extend(temporary.iter().cloned());
        }
        parts.push(format!("{:?}", self.what));
        if !self.interact {
            parts.push("nointeract".to_string());
        }
        if let Some(identifier) = &self.identifier {
            parts.push("id".to_string());
            parts.push(identifier.clone());
        }
        if let Some(arguments) = &self.arguments {
            parts.push(arguments.get_code());
        }
        if let Some(with_) = &self.with_ {
            parts.push("with".to_string());
            parts.push(with_.clone());
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranslateSayNode {
    pub say: SayNode,
    pub language: Option<String>,
    pub alternate: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfBranch {
    pub condition: String,
    pub block: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuChoice {
    pub label: String,
    pub condition: String,
    pub block: Option<Vec<NodeId>>,
    pub arguments: Option<ArgumentInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserStatementNode {
    pub line: String,
    pub statement: String,
    pub parsed: VnValue,
    pub code_block: Option<Vec<NodeId>>,
    pub subblocks: Vec<Vec<NodeId>>,
    pub init_priority: Option<i32>,
}

/// Arena form of a statement: child blocks are lists of node ids, and
/// chaining fills in `Node::next` (plus `Translate::after`).
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Say(SayNode),
    Python {
        code: String,
        store: String,
        hide: bool,
    },
    EarlyPython {
        code: String,
        store: String,
        hide: bool,
    },
    Init {
        priority: i32,
        block: Vec<NodeId>,
    },
    Label {
        name: String,
        parameters: Option<ParameterInfo>,
        block: Vec<NodeId>,
        hide: bool,
    },
    Image {
        name: Vec<String>,
        expr: String,
    },
    Show {
        imspec: ImageSpec,
    },
    Scene {
        imspec: Option<ImageSpec>,
        layer: String,
    },
    Hide {
        imspec: ImageSpec,
    },
    ShowLayer {
        layer: String,
        at_list: Vec<String>,
    },
    Camera {
        layer: String,
        at_list: Vec<String>,
    },
    With {
        expr: String,
        paired: Option<String>,
    },
    Call {
        label: String,
        expression: bool,
        arguments: Option<ArgumentInfo>,
        global_label: String,
    },
    Return {
        expression: Option<String>,
    },
    Jump {
        target: String,
        expression: bool,
        global_label: String,
    },
    Pass,
    While {
        condition: String,
        block: Vec<NodeId>,
    },
    If {
        entries: Vec<IfBranch>,
    },
    Menu {
        items: Vec<MenuChoice>,
        set: Option<String>,
        with_: Option<String>,
        has_caption: bool,
        arguments: Option<ArgumentInfo>,
    },
    UserStatement(UserStatementNode),
    /// Synthesized after a user statement whose kind wants a
    /// post-execution hook.
    PostUserStatement {
        parent: NodeId,
    },
    Define {
        store: String,
        name: String,
        index: Option<String>,
        operator: DefineOperator,
        expr: String,
    },
    Default {
        store: String,
        name: String,
        expr: String,
    },
    Translate {
        identifier: String,
        language: Option<String>,
        block: Vec<NodeId>,
        alternate: Option<String>,
        after: Option<NodeId>,
    },
    TranslateSay(TranslateSayNode),
    EndTranslate,
    TranslateString {
        language: String,
        old: String,
        new: String,
    },
    TranslatePython {
        language: String,
        code: String,
    },
    TranslateBlock {
        language: String,
        block: Vec<NodeId>,
        early: bool,
    },
}

impl NodeKind {
    /// Name reported to statement callbacks and error contexts.
    pub fn statement_name(&self) -> &'static str {
        match self {
            Self::Say(_) | Self::TranslateSay(_) => "say",
            Self::Python { .. } => "python",
            Self::EarlyPython { .. } => "python early",
            Self::Init { .. } => "init",
            Self::Label { .. } => "label",
            Self::Image { .. } => "image",
            Self::Show { .. } => "show",
            Self::Scene { .. } => "scene",
            Self::Hide { .. } => "hide",
            Self::ShowLayer { .. } => "show layer",
            Self::Camera { .. } => "camera",
            Self::With { .. } => "with",
            Self::Call { .. } => "call",
            Self::Return { .. } => "return",
            Self::Jump { .. } => "jump",
            Self::Pass => "pass",
            Self::While { .. } => "while",
            Self::If { .. } => "if",
            Self::Menu { .. } => "menu",
            Self::UserStatement(_) => "user statement",
            Self::PostUserStatement { .. } => "post user statement",
            Self::Define { .. } => "define",
            Self::Default { .. } => "default",
            Self::Translate { .. } => "translate",
            Self::EndTranslate => "end translate",
            Self::TranslateString { .. } => "translate string",
            Self::TranslatePython { .. } => "translate python",
            Self::TranslateBlock { .. } => "translate block",
        }
    }

    /// Every child block owned by this node, in declaration order.
    pub fn blocks(&self) -> Vec<&Vec<NodeId>> {
        match self {
            Self::Init { block, .. }
            | Self::Label { block, .. }
            | Self::While { block, .. }
            | Self::Translate { block, .. }
            | Self::TranslateBlock { block, .. } => vec![block],
            Self::If { entries } => entries.iter().map(|entry| &entry.block).collect(),
            Self::Menu { items, .. } => items.iter().filter_map(|item| item.block.as_ref()).collect(),
            Self::UserStatement(user) => user
                .code_block
                .iter()
                .chain(user.subblocks.iter())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn blocks_mut(&mut self) -> Vec<&mut Vec<NodeId>> {
        match self {
            Self::Init { block, .. }
            | Self::Label { block, .. }
            | Self::While { block, .. }
            | Self::Translate { block, .. }
            | Self::TranslateBlock { block, .. } => vec![block],
            Self::If { entries } => entries.iter_mut().map(|entry| &mut entry.block).collect(),
            Self::Menu { items, .. } => items
                .iter_mut()
                .filter_map(|item| item.block.as_mut())
                .collect(),
            Self::UserStatement(user) => user
                .code_block
                .iter_mut()
                .chain(user.subblocks.iter_mut())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Structural identity tuple used to compare two script trees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DiffInfo {
    Say {
        who: Option<String>,
        what: String,
    },
    TranslateSay {
        identifier: Option<String>,
        language: Option<String>,
    },
    Label(String),
    Call {
        label: String,
        expression: bool,
    },
    Jump {
        target: String,
        expression: bool,
    },
    Return,
    Pass,
    While(String),
    If,
    Menu,
    Python(String),
    EarlyPython(String),
    Init(i32),
    Image(Vec<String>),
    Show(Vec<String>),
    Scene(Option<Vec<String>>),
    Hide(Vec<String>),
    ShowLayer(String),
    Camera(String),
    With(String),
    UserStatement(String),
    PostUserStatement,
    Define {
        store: String,
        name: String,
    },
    Default {
        store: String,
        name: String,
    },
    Translate {
        identifier: String,
        language: Option<String>,
    },
    EndTranslate,
    TranslateString {
        language: String,
        old: String,
    },
    TranslatePython(String),
    TranslateBlock(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: NodeName,
    pub location: SourceLocation,
    pub next: Option<NodeId>,
    pub kind: NodeKind,
}

impl Node {
    pub fn diff_info(&self) -> DiffInfo {
        match &self.kind {
            NodeKind::Say(say) => DiffInfo::Say {
                who: say.who.clone(),
                what: say.what.clone(),
            },
            NodeKind::TranslateSay(translated) => match translated.language {
                None => DiffInfo::Say {
                    who: translated.say.who.clone(),
                    what: translated.say.what.clone(),
                },
                Some(_) => DiffInfo::TranslateSay {
                    identifier: translated.say.identifier.clone(),
                    language: translated.language.clone(),
                },
            },
            NodeKind::Python { code, .. } => DiffInfo::Python(code.clone()),
            NodeKind::EarlyPython { code, .. } => DiffInfo::EarlyPython(code.clone()),
            NodeKind::Init { priority, .. } => DiffInfo::Init(*priority),
            NodeKind::Label { name, .. } => DiffInfo::Label(name.clone()),
            NodeKind::Image { name, .. } => DiffInfo::Image(name.clone()),
            NodeKind::Show { imspec } => DiffInfo::Show(imspec.name.clone()),
            NodeKind::Scene { imspec, .. } => {
                DiffInfo::Scene(imspec.as_ref().map(|imspec| imspec.name.clone()))
            }
            NodeKind::Hide { imspec } => DiffInfo::Hide(imspec.name.clone()),
            NodeKind::ShowLayer { layer, .. } => DiffInfo::ShowLayer(layer.clone()),
            NodeKind::Camera { layer, .. } => DiffInfo::Camera(layer.clone()),
            NodeKind::With { expr, .. } => DiffInfo::With(expr.clone()),
            NodeKind::Call {
                label, expression, ..
            } => DiffInfo::Call {
                label: label.clone(),
                expression: *expression,
            },
            NodeKind::Return { .. } => DiffInfo::Return,
            NodeKind::Jump {
                target, expression, ..
            } => DiffInfo::Jump {
                target: target.clone(),
                expression: *expression,
            },
            NodeKind::Pass => DiffInfo::Pass,
            NodeKind::While { condition, .. } => DiffInfo::While(condition.clone()),
            NodeKind::If { .. } => DiffInfo::If,
            NodeKind::Menu { .. } => DiffInfo::Menu,
            NodeKind::UserStatement(user) => DiffInfo::UserStatement(user.line.clone()),
            NodeKind::PostUserStatement { .. } => DiffInfo::PostUserStatement,
            NodeKind::Define { store, name, .. } => DiffInfo::Define {
                store: store.clone(),
                name: name.clone(),
            },
            NodeKind::Default { store, name, .. } => DiffInfo::Default {
                store: store.clone(),
                name: name.clone(),
            },
            NodeKind::Translate {
                identifier,
                language,
                ..
            } => DiffInfo::Translate {
                identifier: identifier.clone(),
                language: language.clone(),
            },
            NodeKind::EndTranslate => DiffInfo::EndTranslate,
            NodeKind::TranslateString { language, old, .. } => DiffInfo::TranslateString {
                language: language.clone(),
                old: old.clone(),
            },
            NodeKind::TranslatePython { language, .. } => {
                DiffInfo::TranslatePython(language.clone())
            }
            NodeKind::TranslateBlock { language, .. } => DiffInfo::TranslateBlock(language.clone()),
        }
    }

    /// Init priority when this node belongs in the init list.
    pub fn get_init(&self) -> Option<i32> {
        match &self.kind {
            NodeKind::Init { priority, .. } => Some(*priority),
            NodeKind::UserStatement(user) => user.init_priority,
            _ => None,
        }
    }

    /// Source-like rendering of the statement, used by tooling.
    pub fn get_code(&self) -> String {
        match &self.kind {
            NodeKind::Say(say) => say.get_code(),
            NodeKind::TranslateSay(translated) => translated.say.get_code(),
            NodeKind::Python { code, .. } => format!("$ {}", code),
            NodeKind::Call {
                label,
                expression,
                arguments,
                ..
            } => {
                let mut code = if *expression {
                    format!("call expression {}", label)
                } else {
                    format!("call {}", label)
                };
                if let Some(arguments) = arguments {
                    code.push_str(&arguments.get_code());
                }
                code
            }
            NodeKind::Jump {
                target, expression, ..
            } => {
                if *expression {
                    format!("jump expression {}", target)
                } else {
                    format!("jump {}", target)
                }
            }
            NodeKind::Return { expression } => match expression {
                Some(expression) => format!("return {}", expression),
                None => "return".to_string(),
            },
            NodeKind::UserStatement(user) => user.line.clone(),
            NodeKind::Define {
                store,
                name,
                index,
                operator,
                expr,
            } => {
                let prefix = store.strip_prefix("store").unwrap_or(store);
                let prefix = prefix.strip_prefix('.').map(|rest| format!("{}.", rest));
                let index = index
                    .as_ref()
                    .map(|index| format!("[{}]", index))
                    .unwrap_or_default();
                let operator = match operator {
                    DefineOperator::Assign => "=",
                    DefineOperator::Add => "+=",
                    DefineOperator::Union => "|=",
                };
                format!(
                    "define {}{}{} {} {}",
                    prefix.unwrap_or_default(),
                    name,
                    index,
                    operator,
                    expr
                )
            }
            NodeKind::Default {
                store, name, expr, ..
            } => {
                let prefix = store
                    .strip_prefix("store.")
                    .map(|rest| format!("{}.", rest))
                    .unwrap_or_default();
                format!("default {}{} = {}", prefix, name, expr)
            }
            other => other.statement_name().to_string(),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
