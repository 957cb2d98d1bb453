//! Statement batching.
//!
//! Several statements are collapsed into one round trip: plain dialects get
//! a semicolon-terminated script, HANA gets an anonymous `DO BEGIN` block
//! with the bound parameters inlined as `DECLARE` lines (the parameter set
//! is drained, since the values now live in the declarations).

use crate::dialect::{Dialect, Family};
use crate::params::ParameterSet;
use crate::query::QueryCommand;
use crate::render::hana_declare_line;
use crate::rewrite::strip_parameter_markers;

/// Batch assembly state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// No statements pending; single-statement execution applies.
    #[default]
    Idle,
    /// Statements are being collected.
    Accumulating,
    /// The combined text has been produced and the pending list cleared.
    Prepared,
}

/// Ordered statements waiting to be collapsed into one command text.
#[derive(Debug, Default)]
pub struct StatementBatch {
    mode: BatchMode,
    pending: Vec<QueryCommand>,
}

impl StatementBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Append one statement, invalidating any previously prepared text.
    pub fn add(&mut self, command: QueryCommand) {
        self.pending.push(command);
        self.mode = BatchMode::Accumulating;
    }

    /// Abandon the current accumulation cycle. Closing a connection ends
    /// the cycle; statements added afterwards start a new one.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.mode = BatchMode::Idle;
    }

    /// Collapse the pending statements into one command text.
    ///
    /// Returns `None` when there is nothing to do: either no statement was
    /// ever added (the single-statement path applies untouched) or the
    /// batch is already prepared. The pending list is cleared exactly once
    /// per successful prepare.
    pub fn prepare(&mut self, dialect: Dialect, params: &mut ParameterSet) -> Option<String> {
        match self.mode {
            BatchMode::Idle | BatchMode::Prepared => return None,
            BatchMode::Accumulating => {}
        }
        let text = match dialect.family() {
            Family::Hana => self.prepare_hana(params),
            _ => self.prepare_plain(),
        };
        self.pending.clear();
        self.mode = BatchMode::Prepared;
        Some(text)
    }

    fn prepare_hana(&self, params: &mut ParameterSet) -> String {
        let mut out = String::from("DO BEGIN\n");
        for param in params.iter() {
            out.push_str(&hana_declare_line(param));
            out.push('\n');
        }
        params.clear();
        for command in &self.pending {
            let mut text = strip_parameter_markers(&command.text);
            if !text.ends_with(';') {
                text.push(';');
            }
            out.push_str(&text);
            out.push('\n');
        }
        out.push_str("END;");
        out
    }

    fn prepare_plain(&self) -> String {
        let mut out = String::new();
        for command in &self.pending {
            let mut text = command.text.clone();
            if !text.ends_with(';') {
                text.push(';');
            }
            out.push_str(&text);
            out.push('\n');
        }
        out
    }
}
