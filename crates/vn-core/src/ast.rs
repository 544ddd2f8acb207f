use serde::{Deserialize, Serialize};

use crate::types::{
    ArgumentInfo, DefineOperator, ImageSpec, ParameterInfo, SourceLocation,
};
use crate::value::VnValue;

fn default_true() -> bool {
    true
}

fn default_store() -> String {
    "store".to_string()
}

fn default_layer() -> String {
    "master".to_string()
}

fn default_condition() -> String {
    "true".to_string()
}

/// One loaded script file: the already-parsed statement tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptFile {
    pub filename: String,
    #[serde(default)]
    pub version: u32,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(default = "SourceLocation::synthetic")]
    pub location: SourceLocation,
    #[serde(flatten)]
    pub kind: StatementKind,
}

impl Statement {
    pub fn new(location: SourceLocation, kind: StatementKind) -> Self {
        Self { location, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SayStatement {
    #[serde(default)]
    pub who: Option<String>,
    pub what: String,
    #[serde(default, rename = "with")]
    pub with_: Option<String>,
    #[serde(default = "default_true")]
    pub interact: bool,
    #[serde(default)]
    pub attributes: Option<Vec<String>>,
    #[serde(default)]
    pub temporary_attributes: Option<Vec<String>>,
    #[serde(default)]
    pub arguments: Option<ArgumentInfo>,
    #[serde(default)]
    pub identifier: Option<String>,
}

impl SayStatement {
    pub fn new(who: Option<&str>, what: &str) -> Self {
        Self {
            who: who.map(str::to_string),
            what: what.to_string(),
            with_: None,
            interact: true,
            attributes: None,
            temporary_attributes: None,
            arguments: None,
            identifier: None,
        }
    }
}

/// A say statement merged with its translation wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateSayStatement {
    #[serde(flatten)]
    pub say: SayStatement,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub alternate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfEntry {
    #[serde(default = "default_condition")]
    pub condition: String,
    pub block: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub label: String,
    #[serde(default = "default_condition")]
    pub condition: String,
    #[serde(default)]
    pub block: Option<Vec<Statement>>,
    #[serde(default)]
    pub arguments: Option<ArgumentInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatementKind {
    Say(SayStatement),
    Python {
        code: String,
        #[serde(default = "default_store")]
        store: String,
        #[serde(default)]
        hide: bool,
    },
    EarlyPython {
        code: String,
        #[serde(default = "default_store")]
        store: String,
        #[serde(default)]
        hide: bool,
    },
    Init {
        #[serde(default)]
        priority: i32,
        block: Vec<Statement>,
    },
    Label {
        name: String,
        #[serde(default)]
        parameters: Option<ParameterInfo>,
        #[serde(default)]
        block: Vec<Statement>,
        #[serde(default)]
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
        #[serde(default)]
        imspec: Option<ImageSpec>,
        #[serde(default = "default_layer")]
        layer: String,
    },
    Hide {
        imspec: ImageSpec,
    },
    ShowLayer {
        #[serde(default = "default_layer")]
        layer: String,
        #[serde(default)]
        at_list: Vec<String>,
    },
    Camera {
        #[serde(default = "default_layer")]
        layer: String,
        #[serde(default)]
        at_list: Vec<String>,
    },
    With {
        expr: String,
        #[serde(default)]
        paired: Option<String>,
    },
    Call {
        label: String,
        #[serde(default)]
        expression: bool,
        #[serde(default)]
        arguments: Option<ArgumentInfo>,
        #[serde(default)]
        global_label: String,
    },
    Return {
        #[serde(default)]
        expression: Option<String>,
    },
    Jump {
        target: String,
        #[serde(default)]
        expression: bool,
        #[serde(default)]
        global_label: String,
    },
    Pass,
    While {
        condition: String,
        block: Vec<Statement>,
    },
    If {
        entries: Vec<IfEntry>,
    },
    Menu {
        items: Vec<MenuItem>,
        #[serde(default)]
        set: Option<String>,
        #[serde(default, rename = "with")]
        with_: Option<String>,
        #[serde(default)]
        has_caption: bool,
        #[serde(default)]
        arguments: Option<ArgumentInfo>,
    },
    /// A creator-defined statement, dispatched through the statement
    /// registry by its parsed syntax kind.
    UserStatement {
        line: String,
        statement: String,
        #[serde(default)]
        parsed: VnValue,
        #[serde(default)]
        block: Option<Vec<Statement>>,
        #[serde(default)]
        subblocks: Vec<Vec<Statement>>,
    },
    Define {
        #[serde(default = "default_store")]
        store: String,
        name: String,
        #[serde(default)]
        index: Option<String>,
        #[serde(default)]
        operator: DefineOperator,
        expr: String,
    },
    Default {
        #[serde(default = "default_store")]
        store: String,
        name: String,
        expr: String,
    },
    Translate {
        identifier: String,
        #[serde(default)]
        language: Option<String>,
        block: Vec<Statement>,
        #[serde(default)]
        alternate: Option<String>,
    },
    TranslateSay(TranslateSayStatement),
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
        block: Vec<Statement>,
        #[serde(default)]
        early: bool,
    },
}
