use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: usize,
}

impl SourceLocation {
    pub fn new(filename: impl Into<String>, line: usize) -> Self {
        Self {
            filename: filename.into(),
            line,
        }
    }

    pub fn synthetic() -> Self {
        Self::new("<synthetic>", 0)
    }
}

/// Persisted identity of a node. Labels use their own name; anonymous
/// statements get a `(filename, version, serial)` triple that stays stable
/// across reloads of the same script version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeName {
    Label(String),
    Serial {
        filename: String,
        version: u32,
        serial: u32,
    },
}

impl NodeName {
    pub fn label(name: impl Into<String>) -> Self {
        Self::Label(name.into())
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            Self::Label(name) => Some(name.as_str()),
            Self::Serial { .. } => None,
        }
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(name) => f.write_str(name),
            Self::Serial {
                filename,
                version,
                serial,
            } => write!(f, "({}, {}, {})", filename, version, serial),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub parameters: Vec<Parameter>,
}

impl ParameterInfo {
    pub fn positional(names: &[&str]) -> Self {
        Self {
            parameters: names
                .iter()
                .map(|name| Parameter {
                    name: (*name).to_string(),
                    kind: ParameterKind::PositionalOrKeyword,
                    default: None,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unpack {
    #[default]
    None,
    Positional,
    Keyword,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Argument {
    #[serde(default)]
    pub name: Option<String>,
    pub expr: String,
    #[serde(default)]
    pub unpack: Unpack,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArgumentInfo {
    pub arguments: Vec<Argument>,
}

impl ArgumentInfo {
    pub fn positional(exprs: &[&str]) -> Self {
        Self {
            arguments: exprs
                .iter()
                .map(|expr| Argument {
                    name: None,
                    expr: (*expr).to_string(),
                    unpack: Unpack::None,
                })
                .collect(),
        }
    }

    pub fn get_code(&self) -> String {
        let parts = self
            .arguments
            .iter()
            .map(|argument| match (&argument.name, argument.unpack) {
                (_, Unpack::Positional) => format!("*{}", argument.expr),
                (_, Unpack::Keyword) => format!("**{}", argument.expr),
                (Some(name), Unpack::None) => format!("{}={}", name, argument.expr),
                (None, Unpack::None) => argument.expr.clone(),
            })
            .collect::<Vec<_>>();
        format!("({})", parts.join(", "))
    }
}

/// What to show: an image name, or an expression plus an optional tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSpec {
    pub name: Vec<String>,
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub at_list: Vec<String>,
    #[serde(default)]
    pub layer: Option<String>,
    #[serde(default)]
    pub zorder: Option<String>,
    #[serde(default)]
    pub behind: Vec<String>,
}

impl ImageSpec {
    pub fn named(name: &[&str]) -> Self {
        Self {
            name: name.iter().map(|part| (*part).to_string()).collect(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefineOperator {
    #[default]
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    Add,
    #[serde(rename = "|=")]
    Union,
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn node_names_roundtrip_through_json() {
        let serial = NodeName::Serial {
            filename: "game/script.rpy".to_string(),
            version: 3,
            serial: 17,
        };
        let json = serde_json::to_string(&serial).expect("serialize");
        let back: NodeName = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, serial);

        let label: NodeName = serde_json::from_str("\"start\"").expect("label");
        assert_eq!(label.as_label(), Some("start"));
        assert_eq!(serial.to_string(), "(game/script.rpy, 3, 17)");
    }

    #[test]
    fn argument_code_renders_all_forms() {
        let info = ArgumentInfo {
            arguments: vec![
                Argument {
                    name: None,
                    expr: "1".to_string(),
                    unpack: Unpack::None,
                },
                Argument {
                    name: Some("mood".to_string()),
                    expr: "\"happy\"".to_string(),
                    unpack: Unpack::None,
                },
                Argument {
                    name: None,
                    expr: "rest".to_string(),
                    unpack: Unpack::Positional,
                },
            ],
        };
        assert_eq!(info.get_code(), "(1, mood=\"happy\", *rest)");
    }
}
