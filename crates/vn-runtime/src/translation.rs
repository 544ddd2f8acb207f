use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// FNV-1a offset basis (64-bit).
const FNV_OFFSET_BASIS: u64 = 14_695_981_039_346_656_037;
/// FNV-1a prime (64-bit).
const FNV_PRIME: u64 = 1_099_511_628_211;

/// Key for a translation identifier when seen translations are stored
/// hashed. FNV-1a over the UTF-8 bytes, so saved keys are the same on
/// every platform.
pub fn hash_identifier(identifier: &str) -> String {
    let hash = identifier.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    });
    format!("{:016x}", hash)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationCounters {
    /// Translated lines shown at least once.
    pub seen: u64,
    /// Translated lines shown for the first time in this session.
    pub new: u64,
}

/// State that survives rollback and outlives a single playthrough.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistentState {
    pub seen_translates: BTreeSet<String>,
    pub seen_labels: BTreeSet<String>,
}

impl PersistentState {
    pub fn has_seen_translate(&self, identifier: &str) -> bool {
        self.seen_translates.contains(identifier)
            || self.seen_translates.contains(&hash_identifier(identifier))
    }

    /// Records `identifier` once; returns whether it was new.
    pub fn mark_translate_seen(&mut self, identifier: &str, hashed: bool) -> bool {
        if self.has_seen_translate(identifier) {
            return false;
        }
        let key = if hashed {
            hash_identifier(identifier)
        } else {
            identifier.to_string()
        };
        self.seen_translates.insert(key)
    }
}

/// `(language, old) -> new` replacements for interface strings such as
/// menu captions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringTranslations {
    by_language: BTreeMap<String, BTreeMap<String, String>>,
}

impl StringTranslations {
    pub fn add(&mut self, language: &str, old: &str, new: &str) {
        self.by_language
            .entry(language.to_string())
            .or_default()
            .insert(old.to_string(), new.to_string());
    }

    pub fn translate<'a>(&'a self, language: Option<&str>, text: &'a str) -> &'a str {
        language
            .and_then(|language| self.by_language.get(language))
            .and_then(|table| table.get(text))
            .map(String::as_str)
            .unwrap_or(text)
    }
}
