use crate::config::ValidationConfig;
use crate::errors::EditResult;
use crate::fixes::{self, FixAction, Selection};
use crate::graph::Graph;
use crate::issue::ValidationIssue;
use crate::types::EntityId;

/// One committed version of the graph.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub graph: Graph,
    pub annotation: Option<String>,
    pub selected_ids: Vec<EntityId>,
}

/// Holds the committed history and a staging graph that actions are performed on.
#[derive(Debug)]
pub struct Editor {
    history: Vec<HistoryEntry>,
    index: usize,
    staging: Graph,
}

impl Editor {
    pub fn new(base: Graph) -> Self {
        Editor {
            history: vec![HistoryEntry { graph: base.clone(), annotation: None, selected_ids: Vec::new() }],
            index: 0,
            staging: base,
        }
    }

    pub fn staging_graph(&self) -> &Graph {
        &self.staging
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.history[self.index]
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.history.len()
    }

    /// Applies `action` to the staging graph. On error nothing is staged.
    pub fn perform<F>(&mut self, action: F) -> EditResult<()>
    where
        F: FnOnce(&Graph) -> EditResult<Graph>,
    {
        self.staging = action(&self.staging)?;
        Ok(())
    }

    /// Records the staging graph as a new history step, dropping any redo steps.
    pub fn commit(&mut self, annotation: &str, selected_ids: Vec<EntityId>) {
        self.history.truncate(self.index + 1);
        self.history.push(HistoryEntry {
            graph: self.staging.clone(),
            annotation: Some(annotation.to_string()),
            selected_ids,
        });
        self.index += 1;
        log::info!("Committed '{}' ({} steps)", annotation, self.index);
    }

    /// Throws away everything performed since the last commit.
    pub fn rollback(&mut self) {
        self.staging = self.current().graph.clone();
    }

    /// Steps back one commit; returns the annotation of the undone step.
    pub fn undo(&mut self) -> Option<String> {
        if !self.can_undo() {
            return None;
        }
        let undone = self.history[self.index].annotation.clone();
        self.index -= 1;
        self.rollback();
        log::info!("Undid {:?}", undone);
        undone
    }

    pub fn redo(&mut self) -> Option<String> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.rollback();
        let redone = self.current().annotation.clone();
        log::info!("Redid {:?}", redone);
        redone
    }

    /// Runs a fix against the staging graph and commits it as one step.
    ///
    /// Returns `false`, leaving history and staging alone, when the fix no
    /// longer applies.
    pub fn apply_fix(
        &mut self,
        action: &FixAction,
        issue: &ValidationIssue,
        selection: &Selection,
        config: &ValidationConfig,
    ) -> bool {
        match fixes::apply_fix(action, issue, &self.staging, selection, config) {
            Some(outcome) => {
                self.staging = outcome.graph;
                self.commit(&outcome.annotation, outcome.selected_ids);
                true
            }
            None => false,
        }
    }
}
