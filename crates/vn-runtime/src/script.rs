use std::collections::BTreeSet;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use vn_core::{NodeName, ScriptFile, SourceLocation, Statement, StatementKind, VnError};

use crate::node::{
    IfBranch, MenuChoice, Node, NodeId, NodeKind, SayNode, TranslateSayNode, UserStatementNode,
};
use crate::statements::StatementRegistry;

#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub filename: String,
    pub version: u32,
    pub root: Vec<NodeId>,
}

/// Index of `translate` entry points by identifier and language.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    default_translates: FxHashMap<String, NodeId>,
    language_translates: FxHashMap<(String, String), NodeId>,
    languages: BTreeSet<String>,
}

fn normalize_identifier(identifier: &str) -> String {
    identifier.replace('.', "_")
}

impl Translator {
    fn take_translates(&mut self, nodes: &[Node]) -> Result<(), VnError> {
        for (index, node) in nodes.iter().enumerate() {
            let (identifier, language) = match &node.kind {
                NodeKind::Translate {
                    identifier,
                    language,
                    ..
                } => (identifier, language),
                NodeKind::TranslateSay(translated) => match &translated.say.identifier {
                    Some(identifier) => (identifier, &translated.language),
                    None => continue,
                },
                _ => continue,
            };
            let identifier = normalize_identifier(identifier);
            let duplicate = match language {
                None => self
                    .default_translates
                    .insert(identifier.clone(), NodeId(index))
                    .is_some(),
                Some(language) => {
                    self.languages.insert(language.clone());
                    self.language_translates
                        .insert((identifier.clone(), language.clone()), NodeId(index))
                        .is_some()
                }
            };
            if duplicate {
                return Err(VnError::structural(
                    "TRANSLATE_DUPLICATE",
                    format!(
                        "A translation for \"{}\" already exists{}.",
                        identifier,
                        language
                            .as_ref()
                            .map(|language| format!(" in language {}", language))
                            .unwrap_or_default()
                    ),
                )
                .at(&node.location, "translate"));
            }
        }
        Ok(())
    }

    /// Entry node for `identifier`, preferring the language-specific one,
    /// then the alternate identifier, then the canonical translation.
    pub fn lookup(
        &self,
        identifier: &str,
        alternate: Option<&str>,
        language: Option<&str>,
    ) -> Result<NodeId, VnError> {
        let identifier = normalize_identifier(identifier);
        if let Some(language) = language {
            let found = self
                .language_translates
                .get(&(identifier.clone(), language.to_string()))
                .or_else(|| {
                    alternate.and_then(|alternate| {
                        self.language_translates
                            .get(&(normalize_identifier(alternate), language.to_string()))
                    })
                });
            if let Some(found) = found {
                return Ok(*found);
            }
        }
        self.default_translates
            .get(&identifier)
            .copied()
            .ok_or_else(|| {
                VnError::resolution(
                    "TRANSLATE_MISSING",
                    format!("Unknown translation identifier \"{}\".", identifier),
                )
            })
    }

    pub fn has_translation(&self, identifier: &str, language: &str) -> bool {
        self.language_translates
            .contains_key(&(normalize_identifier(identifier), language.to_string()))
    }

    pub fn default_translate(&self, identifier: &str) -> Option<NodeId> {
        self.default_translates
            .get(&normalize_identifier(identifier))
            .copied()
    }

    pub fn languages(&self) -> &BTreeSet<String> {
        &self.languages
    }

    /// Canonical identifiers, sorted.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut identifiers = self
            .default_translates
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>();
        identifiers.sort_unstable();
        identifiers
    }

    /// Language-specific entries whose identifier has no canonical node.
    pub fn orphans(&self) -> Vec<(&str, &str, NodeId)> {
        let mut orphans = self
            .language_translates
            .iter()
            .filter(|((identifier, _), _)| !self.default_translates.contains_key(identifier))
            .map(|((identifier, language), id)| (identifier.as_str(), language.as_str(), *id))
            .collect::<Vec<_>>();
        orphans.sort();
        orphans
    }

    /// The canonical entry followed by every language entry, by language.
    pub fn get_all_translates(&self, identifier: &str) -> Vec<(Option<String>, NodeId)> {
        let identifier = normalize_identifier(identifier);
        let mut out = Vec::new();
        if let Some(id) = self.default_translates.get(&identifier) {
            out.push((None, *id));
        }
        for language in &self.languages {
            if let Some(id) = self
                .language_translates
                .get(&(identifier.clone(), language.clone()))
            {
                out.push((Some(language.clone()), *id));
            }
        }
        out
    }
}

/// The loaded, named and chained node table shared by every session.
#[derive(Debug, Clone)]
pub struct Script {
    nodes: Vec<Node>,
    node_files: Vec<usize>,
    files: Vec<LoadedFile>,
    namemap: FxHashMap<NodeName, NodeId>,
    serials: Vec<u32>,
    translator: Translator,
    init_order: Vec<NodeId>,
    registry: Arc<StatementRegistry>,
}

impl Script {
    #[tracing::instrument(level = "debug", skip_all, fields(files = files.len()))]
    pub fn load(
        files: Vec<ScriptFile>,
        registry: Arc<StatementRegistry>,
    ) -> Result<Self, VnError> {
        let mut script = Self {
            nodes: Vec::new(),
            node_files: Vec::new(),
            files: Vec::new(),
            namemap: FxHashMap::default(),
            serials: Vec::new(),
            translator: Translator::default(),
            init_order: Vec::new(),
            registry,
        };

        for file in files {
            script.add_file(file)?;
        }
        script.restructure(&mut Self::insert_post_user_statements)?;

        let roots = script
            .files
            .iter()
            .map(|file| file.root.clone())
            .collect::<Vec<_>>();
        for root in &roots {
            script.chain_block(root, None);
        }

        let mut translator = Translator::default();
        translator.take_translates(&script.nodes)?;
        script.translator = translator;
        script.chain_translates();

        let mut init_order = Vec::new();
        for root in &roots {
            script.collect_init(root, &mut init_order);
        }
        init_order.sort_by_key(|id| script.nodes[id.0].get_init().unwrap_or_default());
        script.init_order = init_order;

        tracing::debug!(
            nodes = script.nodes.len(),
            labels = script.labels().count(),
            inits = script.init_order.len(),
            "script loaded"
        );
        Ok(script)
    }

    fn add_file(&mut self, file: ScriptFile) -> Result<(), VnError> {
        let file_index = self.files.len();
        self.files.push(LoadedFile {
            filename: file.filename,
            version: file.version,
            root: Vec::new(),
        });
        self.serials.push(0);
        let root = self.add_block(file_index, file.statements)?;
        self.files[file_index].root = root;
        Ok(())
    }

    fn add_block(
        &mut self,
        file_index: usize,
        block: Vec<Statement>,
    ) -> Result<Vec<NodeId>, VnError> {
        block
            .into_iter()
            .map(|statement| self.add_statement(file_index, statement))
            .collect()
    }

    fn next_serial_name(&mut self, file_index: usize) -> NodeName {
        self.serials[file_index] += 1;
        let file = &self.files[file_index];
        NodeName::Serial {
            filename: file.filename.clone(),
            version: file.version,
            serial: self.serials[file_index],
        }
    }

    fn push_node(
        &mut self,
        file_index: usize,
        name: NodeName,
        location: SourceLocation,
        kind: NodeKind,
    ) -> Result<NodeId, VnError> {
        let id = NodeId(self.nodes.len());
        if self.namemap.contains_key(&name) {
            return Err(VnError::structural(
                "LOAD_DUPLICATE_LABEL",
                format!("The label {} is defined twice.", name),
            )
            .at(&location, kind.statement_name()));
        }
        self.namemap.insert(name.clone(), id);
        self.nodes.push(Node {
            name,
            location,
            next: None,
            kind,
        });
        self.node_files.push(file_index);
        Ok(id)
    }

    fn add_statement(
        &mut self,
        file_index: usize,
        statement: Statement,
    ) -> Result<NodeId, VnError> {
        let Statement { location, kind } = statement;
        let label = match &kind {
            StatementKind::Label { name, .. } => Some(name.clone()),
            StatementKind::UserStatement {
                statement, parsed, ..
            } => self
                .registry
                .get(statement)
                .map_err(|error| error.at(&location, "user statement"))?
                .label(parsed),
            _ => None,
        };
        let name = match label {
            Some(label) => NodeName::Label(label),
            None => self.next_serial_name(file_index),
        };
        // Parents are pushed before their children so arena order is lexical.
        let id = self.push_node(file_index, name, location, NodeKind::Pass)?;
        let kind = self.convert_kind(file_index, kind)?;
        self.nodes[id.0].kind = kind;
        Ok(id)
    }

    fn convert_kind(&mut self, file: usize, kind: StatementKind) -> Result<NodeKind, VnError> {
        Ok(match kind {
            StatementKind::Say(say) => NodeKind::Say(SayNode::from_statement(say)),
            StatementKind::Python { code, store, hide } => NodeKind::Python { code, store, hide },
            StatementKind::EarlyPython { code, store, hide } => {
                NodeKind::EarlyPython { code, store, hide }
            }
            StatementKind::Init { priority, block } => NodeKind::Init {
                priority,
                block: self.add_block(file, block)?,
            },
            StatementKind::Label {
                name,
                parameters,
                block,
                hide,
            } => NodeKind::Label {
                name,
                parameters,
                block: self.add_block(file, block)?,
                hide,
            },
            StatementKind::Image { name, expr } => NodeKind::Image { name, expr },
            StatementKind::Show { imspec } => NodeKind::Show { imspec },
            StatementKind::Scene { imspec, layer } => NodeKind::Scene { imspec, layer },
            StatementKind::Hide { imspec } => NodeKind::Hide { imspec },
            StatementKind::ShowLayer { layer, at_list } => NodeKind::ShowLayer { layer, at_list },
            StatementKind::Camera { layer, at_list } => NodeKind::Camera { layer, at_list },
            StatementKind::With { expr, paired } => NodeKind::With { expr, paired },
            StatementKind::Call {
                label,
                expression,
                arguments,
                global_label,
            } => NodeKind::Call {
                label,
                expression,
                arguments,
                global_label,
            },
            StatementKind::Return { expression } => NodeKind::Return { expression },
            StatementKind::Jump {
                target,
                expression,
                global_label,
            } => NodeKind::Jump {
                target,
                expression,
                global_label,
            },
            StatementKind::Pass => NodeKind::Pass,
            StatementKind::While { condition, block } => NodeKind::While {
                condition,
                block: self.add_block(file, block)?,
            },
            StatementKind::If { entries } => {
                let mut branches = Vec::with_capacity(entries.len());
                for entry in entries {
                    branches.push(IfBranch {
                        condition: entry.condition,
                        block: self.add_block(file, entry.block)?,
                    });
                }
                NodeKind::If { entries: branches }
            }
            StatementKind::Menu {
                items,
                set,
                with_,
                has_caption,
                arguments,
            } => {
                let mut choices = Vec::with_capacity(items.len());
                for item in items {
                    let block = match item.block {
                        Some(block) => Some(self.add_block(file, block)?),
                        None => None,
                    };
                    choices.push(MenuChoice {
                        label: item.label,
                        condition: item.condition,
                        block,
                        arguments: item.arguments,
                    });
                }
                NodeKind::Menu {
                    items: choices,
                    set,
                    with_,
                    has_caption,
                    arguments,
                }
            }
            StatementKind::UserStatement {
                line,
                statement,
                parsed,
                block,
                subblocks,
            } => {
                let init_priority = self.registry.get(&statement)?.init_priority(&parsed);
                let code_block = match block {
                    Some(block) => Some(self.add_block(file, block)?),
                    None => None,
                };
                let subblocks = subblocks
                    .into_iter()
                    .map(|block| self.add_block(file, block))
                    .collect::<Result<Vec<_>, _>>()?;
                NodeKind::UserStatement(UserStatementNode {
                    line,
                    statement,
                    parsed,
                    code_block,
                    subblocks,
                    init_priority,
                })
            }
            StatementKind::Define {
                store,
                name,
                index,
                operator,
                expr,
            } => NodeKind::Define {
                store,
                name,
                index,
                operator,
                expr,
            },
            StatementKind::Default { store, name, expr } => NodeKind::Default { store, name, expr },
            StatementKind::Translate {
                identifier,
                language,
                block,
                alternate,
            } => NodeKind::Translate {
                identifier,
                language,
                block: self.add_block(file, block)?,
                alternate,
                after: None,
            },
            StatementKind::TranslateSay(translated) => NodeKind::TranslateSay(TranslateSayNode {
                say: SayNode::from_statement(translated.say),
                language: translated.language,
                alternate: translated.alternate,
            }),
            StatementKind::EndTranslate => NodeKind::EndTranslate,
            StatementKind::TranslateString { language, old, new } => {
                NodeKind::TranslateString { language, old, new }
            }
            StatementKind::TranslatePython { language, code } => {
                NodeKind::TranslatePython { language, code }
            }
            StatementKind::TranslateBlock {
                language,
                block,
                early,
            } => NodeKind::TranslateBlock {
                language,
                block: self.add_block(file, block)?,
                early,
            },
        })
    }

    /// Hands every block in the table to `visitor`, file roots first, then
    /// each node's child blocks. Nodes the visitor adds are visited too.
    pub fn restructure<F>(&mut self, visitor: &mut F) -> Result<(), VnError>
    where
        F: FnMut(&mut Script, &mut Vec<NodeId>) -> Result<(), VnError>,
    {
        for index in 0..self.files.len() {
            let mut root = std::mem::take(&mut self.files[index].root);
            let result = visitor(self, &mut root);
            self.files[index].root = root;
            result?;
        }
        let mut index = 0;
        while index < self.nodes.len() {
            self.restructure_node(NodeId(index), visitor)?;
            index += 1;
        }
        Ok(())
    }

    pub fn restructure_node<F>(&mut self, id: NodeId, visitor: &mut F) -> Result<(), VnError>
    where
        F: FnMut(&mut Script, &mut Vec<NodeId>) -> Result<(), VnError>,
    {
        let mut blocks = self.nodes[id.0]
            .kind
            .blocks_mut()
            .into_iter()
            .map(std::mem::take)
            .collect::<Vec<_>>();
        let mut result = Ok(());
        for block in &mut blocks {
            result = visitor(self, block);
            if result.is_err() {
                break;
            }
        }
        for (slot, block) in self.nodes[id.0].kind.blocks_mut().into_iter().zip(blocks) {
            *slot = block;
        }
        result
    }

    /// Adds a node that did not come from source, named like its sibling.
    pub fn insert_synthetic(&mut self, sibling: NodeId, kind: NodeKind) -> NodeId {
        let file_index = self.node_files[sibling.0];
        let location = self.nodes[sibling.0].location.clone();
        let name = self.next_serial_name(file_index);
        let id = NodeId(self.nodes.len());
        self.namemap.insert(name.clone(), id);
        self.nodes.push(Node {
            name,
            location,
            next: None,
            kind,
        });
        self.node_files.push(file_index);
        id
    }

    fn insert_post_user_statements(
        script: &mut Script,
        block: &mut Vec<NodeId>,
    ) -> Result<(), VnError> {
        let mut index = 0;
        while index < block.len() {
            let id = block[index];
            let wants_post = match &script.nodes[id.0].kind {
                NodeKind::UserStatement(user) => {
                    script.registry.get(&user.statement)?.has_post_execute()
                }
                _ => false,
            };
            let already = block.get(index + 1).is_some_and(|following| {
                matches!(
                    script.nodes[following.0].kind,
                    NodeKind::PostUserStatement { parent } if parent == id
                )
            });
            if wants_post && !already {
                let post = script.insert_synthetic(id, NodeKind::PostUserStatement { parent: id });
                block.insert(index + 1, post);
                index += 1;
            }
            index += 1;
        }
        Ok(())
    }

    pub fn chain_block(&mut self, block: &[NodeId], next: Option<NodeId>) {
        for pair in block.windows(2) {
            self.chain(pair[0], Some(pair[1]));
        }
        if let Some(last) = block.last() {
            self.chain(*last, next);
        }
    }

    /// Sets `id`'s successor to `next` and chains its child blocks.
    pub fn chain(&mut self, id: NodeId, next: Option<NodeId>) {
        let node = &mut self.nodes[id.0];
        let mut plan: Vec<(Vec<NodeId>, Option<NodeId>)> = Vec::new();
        node.next = match &mut node.kind {
            NodeKind::Init { block, .. } | NodeKind::TranslateBlock { block, .. } => {
                plan.push((block.clone(), None));
                next
            }
            NodeKind::Label { block, .. } => {
                plan.push((block.clone(), next));
                block.first().copied().or(next)
            }
            NodeKind::Return { .. } | NodeKind::Jump { .. } => None,
            NodeKind::While { block, .. } => {
                plan.push((block.clone(), Some(id)));
                next
            }
            NodeKind::Translate { block, after, .. } => {
                *after = next;
                plan.push((block.clone(), next));
                block.first().copied().or(next)
            }
            _ => next,
        };
        if matches!(
            node.kind,
            NodeKind::If { .. } | NodeKind::Menu { .. } | NodeKind::UserStatement(_)
        ) {
            plan.extend(
                node.kind
                    .blocks()
                    .into_iter()
                    .map(|block| (block.clone(), next)),
            );
        }
        for (block, block_next) in plan {
            self.chain_block(&block, block_next);
        }
    }

    /// Points language-specific translations back at the statement after
    /// their canonical translation.
    fn chain_translates(&mut self) {
        let mut pairs = self
            .translator
            .language_translates
            .iter()
            .filter_map(|((identifier, _), language_node)| {
                self.translator
                    .default_translates
                    .get(identifier)
                    .map(|canonical| (*language_node, *canonical))
            })
            .collect::<Vec<_>>();
        pairs.sort();
        for (language_node, canonical) in pairs {
            let after = match &self.nodes[canonical.0].kind {
                NodeKind::Translate { after, .. } => *after,
                _ => self.nodes[canonical.0].next,
            };
            self.chain(language_node, after);
        }
    }

    /// Redirects edges that pointed at `old` so they reach `new` first.
    pub fn replace_next(&mut self, id: NodeId, old: NodeId, new: NodeId) {
        let node = &mut self.nodes[id.0];
        if node.next == Some(old) {
            node.next = Some(new);
        }
        if let NodeKind::Translate { after, .. } = &mut node.kind {
            if *after == Some(old) {
                *after = Some(new);
            }
        }
        if matches!(
            node.kind,
            NodeKind::Translate { .. }
                | NodeKind::While { .. }
                | NodeKind::If { .. }
                | NodeKind::Menu { .. }
                | NodeKind::UserStatement(_)
        ) {
            for block in node.kind.blocks_mut() {
                if block.first() == Some(&old) {
                    block.insert(0, new);
                }
            }
        }
    }

    fn collect_init(&self, block: &[NodeId], out: &mut Vec<NodeId>) {
        for id in block {
            if self.nodes[id.0].get_init().is_some() {
                out.push(*id);
                continue;
            }
            for child in self.nodes[id.0].kind.blocks() {
                self.collect_init(child, out);
            }
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn files(&self) -> &[LoadedFile] {
        &self.files
    }

    pub fn registry(&self) -> &StatementRegistry {
        &self.registry
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Init-phase entry points, by priority then source order.
    pub fn init_order(&self) -> &[NodeId] {
        &self.init_order
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.namemap
            .iter()
            .filter_map(|(name, id)| name.as_label().map(|label| (label, *id)))
    }

    pub fn lookup(&self, name: &NodeName) -> Result<NodeId, VnError> {
        self.namemap.get(name).copied().ok_or_else(|| {
            VnError::resolution(
                "LABEL_MISSING",
                format!("Could not find label '{}'.", name),
            )
        })
    }

    pub fn lookup_label(&self, label: &str) -> Result<NodeId, VnError> {
        self.lookup(&NodeName::label(label))
    }

    pub fn lookup_or_none(&self, name: &NodeName) -> Option<NodeId> {
        self.namemap.get(name).copied()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.namemap.contains_key(&NodeName::label(label))
    }

    /// Executable target of a translation entry: the head of a translate
    /// block, or the translated line itself.
    pub fn translate_target(&self, entry: NodeId) -> Option<NodeId> {
        match &self.nodes[entry.0].kind {
            NodeKind::Translate { block, after, .. } => block.first().copied().or(*after),
            NodeKind::TranslateSay(_) => Some(entry),
            _ => None,
        }
    }

    /// Strings a translator has to provide for this node.
    pub fn translation_strings(&self, id: NodeId) -> Vec<String> {
        match &self.nodes[id.0].kind {
            NodeKind::Say(say) => vec![say.what.clone()],
            NodeKind::TranslateSay(translated) => vec![translated.say.what.clone()],
            NodeKind::Menu { items, .. } => items.iter().map(|item| item.label.clone()).collect(),
            NodeKind::UserStatement(user) => self
                .registry
                .get(&user.statement)
                .map(|kind| kind.translation_strings(&user.parsed))
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}
