//! Per-dialect text registry for a logical query.
//!
//! A `Query` holds one command text per dialect plus a base dialect used as
//! the fallback. Asking for the HANA text when only the base is registered
//! translates the base text once and caches the result in the registry, so
//! later lookups (and template substitutions) see a plain entry.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::dialect::Dialect;
use crate::rewrite::rewrite_for_hana;

/// One finalized command text for one dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCommand {
    pub dialect: Dialect,
    pub text: String,
}

impl QueryCommand {
    /// Build a command, normalizing HANA text on the way in so hand-written
    /// and auto-translated commands agree.
    pub fn new(dialect: Dialect, text: impl Into<String>) -> Self {
        let mut text = text.into();
        if dialect.is_block_dialect() {
            text = rewrite_for_hana(&text);
        }
        Self { dialect, text }
    }
}

/// Dialect-to-text registry for one logical query.
///
/// Always contains an entry for its base dialect.
#[derive(Debug)]
pub struct Query {
    base: Dialect,
    texts: RwLock<HashMap<Dialect, String>>,
}

impl Query {
    /// Create a query whose base entry is `text` under `base`.
    pub fn new(base: Dialect, text: impl Into<String>) -> Self {
        let query = Self {
            base,
            texts: RwLock::new(HashMap::new()),
        };
        query.set_text(base, text);
        query
    }

    /// Create a query from pre-built commands. The base entry may be
    /// absent; lookups for it then yield an empty text, which execution
    /// rejects as a missing command.
    pub fn from_commands(base: Dialect, commands: impl IntoIterator<Item = QueryCommand>) -> Self {
        let query = Self {
            base,
            texts: RwLock::new(HashMap::new()),
        };
        {
            let mut texts = query.write();
            for command in commands {
                texts.insert(command.dialect, command.text);
            }
        }
        query
    }

    pub fn base(&self) -> Dialect {
        self.base
    }

    /// Register or overwrite the text for one dialect.
    ///
    /// The text passes through [`QueryCommand::new`], so a HANA entry is
    /// normalized on the way in and hand-written HANA text agrees with
    /// auto-translated text. Bracketed template markers in a HANA entry
    /// come out double-quoted (`$[Name]` becomes `$"Name"`).
    pub fn set_text(&self, dialect: Dialect, text: impl Into<String>) -> &Self {
        let command = QueryCommand::new(dialect, text);
        self.write().insert(command.dialect, command.text);
        self
    }

    pub fn has_text(&self, dialect: Dialect) -> bool {
        self.read().contains_key(&dialect)
    }

    /// Registered dialects, in discriminant order.
    pub fn dialects(&self) -> Vec<Dialect> {
        let mut dialects: Vec<Dialect> = self.read().keys().copied().collect();
        dialects.sort();
        dialects
    }

    /// The text to run under `dialect`.
    ///
    /// Returns the dialect's own entry when present, otherwise the base
    /// entry. A HANA request without a HANA entry translates the base text
    /// and caches it, exactly once per registry.
    pub fn text_for(&self, dialect: Dialect) -> String {
        {
            let texts = self.read();
            if let Some(text) = texts.get(&dialect) {
                return text.clone();
            }
            if !dialect.is_block_dialect() {
                return texts.get(&self.base).cloned().unwrap_or_default();
            }
        }
        let mut texts = self.write();
        // A concurrent caller may have translated already; same input,
        // same output, so either insertion wins.
        if let Some(text) = texts.get(&dialect) {
            return text.clone();
        }
        let translated = texts
            .get(&self.base)
            .map(|base| rewrite_for_hana(base))
            .unwrap_or_default();
        texts.insert(dialect, translated.clone());
        translated
    }

    /// Template substitution on one dialect's entry; no effect when the
    /// dialect has no entry. Chainable.
    pub fn replace_text(&self, dialect: Dialect, from: &str, to: &str) -> &Self {
        let mut texts = self.write();
        if let Some(text) = texts.get_mut(&dialect) {
            *text = text.replace(from, to);
        }
        self
    }

    /// Template substitution across every registered entry. Chainable.
    pub fn replace_text_all(&self, from: &str, to: &str) -> &Self {
        let mut texts = self.write();
        for text in texts.values_mut() {
            *text = text.replace(from, to);
        }
        self
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Dialect, String>> {
        self.texts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Dialect, String>> {
        self.texts.write().unwrap_or_else(PoisonError::into_inner)
    }
}
