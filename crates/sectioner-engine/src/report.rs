// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Run reports

use crate::registry::SectionEntry;
use sectioner_model::{ElementId, LinkId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress of one section within one scope
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchState {
    #[default]
    Idle,
    CandidatesBuilt,
    AttributesAssigned,
    Committed,
    Failed,
}

/// Counts for one section in one scope
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionOutcome {
    pub label: String,
    pub form_id: ElementId,
    /// Eligible elements matched by the section's predicate
    pub candidates: usize,
    /// Writes issued
    pub writes: usize,
    /// Matches already holding the section identifier
    pub unchanged: usize,
    /// Matches whose target attribute is read-only
    pub skipped_read_only: usize,
    /// Matches without the target attribute
    pub skipped_absent: usize,
    /// Matches won by another section under the match policy
    pub superseded: usize,
    pub state: BatchState,
}

impl SectionOutcome {
    /// Empty outcome for a registry entry
    pub fn new(entry: &SectionEntry) -> Self {
        Self {
            label: entry.label.clone(),
            form_id: entry.form_id,
            ..Default::default()
        }
    }
}

/// Final status of a scope
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeStatus {
    /// Every batch committed (or nothing needed writing)
    Committed,
    /// Opening, writing or committing failed
    Failed,
    /// Not processed (unresolved or filtered out)
    Skipped,
    /// Stopped by cancellation
    Cancelled,
}

/// Where a scope came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScopeOrigin {
    Primary,
    Link { id: LinkId },
}

/// Outcome of synchronizing a link with its central copy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SyncOutcome {
    Synchronized,
    Failed { reason: String },
}

/// Outcome of one scope
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScopeReport {
    pub scope: String,
    pub origin: ScopeOrigin,
    pub status: ScopeStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<SectionOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncOutcome>,
}

impl ScopeReport {
    /// Report for a scope about to be classified
    pub fn new(scope: impl Into<String>, origin: ScopeOrigin) -> Self {
        Self {
            scope: scope.into(),
            origin,
            status: ScopeStatus::Committed,
            sections: Vec::new(),
            reason: None,
            sync: None,
        }
    }

    /// Report for a scope that was not processed
    pub fn skipped(scope: impl Into<String>, origin: ScopeOrigin, reason: impl Into<String>) -> Self {
        Self::new(scope, origin).with_status(ScopeStatus::Skipped, Some(reason.into()))
    }

    /// Report for a scope that failed before classification
    pub fn failed(scope: impl Into<String>, origin: ScopeOrigin, reason: impl Into<String>) -> Self {
        Self::new(scope, origin).with_status(ScopeStatus::Failed, Some(reason.into()))
    }

    /// Report for a scope never reached because the run was cancelled
    pub fn cancelled(scope: impl Into<String>, origin: ScopeOrigin) -> Self {
        Self::new(scope, origin).with_status(ScopeStatus::Cancelled, None)
    }

    fn with_status(mut self, status: ScopeStatus, reason: Option<String>) -> Self {
        self.status = status;
        self.reason = reason;
        self
    }

    /// Outcome of a section by label (first entry with that label)
    pub fn section(&self, label: &str) -> Option<&SectionOutcome> {
        self.sections.iter().find(|s| s.label == label)
    }

    /// Writes issued across all sections
    pub fn writes(&self) -> usize {
        self.sections.iter().map(|s| s.writes).sum()
    }

    /// Writes made durable
    pub fn committed_writes(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| s.state == BatchState::Committed)
            .map(|s| s.writes)
            .sum()
    }

    /// Matches already holding their section identifier
    pub fn unchanged(&self) -> usize {
        self.sections.iter().map(|s| s.unchanged).sum()
    }
}

/// Outcome of a whole run
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub scopes: Vec<ScopeReport>,
    /// Links unloaded during the run and reloaded afterwards
    pub reloaded_links: Vec<LinkId>,
    /// Per-link warnings (open, synchronize, close and reload failures)
    pub warnings: Vec<String>,
    pub cancelled: bool,
}

impl RunReport {
    /// Report of a scope by name
    pub fn scope(&self, name: &str) -> Option<&ScopeReport> {
        self.scopes.iter().find(|s| s.scope == name)
    }

    /// Writes made durable across every scope
    pub fn committed_writes(&self) -> usize {
        self.scopes.iter().map(ScopeReport::committed_writes).sum()
    }

    /// Scopes whose processing failed
    pub fn failed_scopes(&self) -> impl Iterator<Item = &ScopeReport> {
        self.scopes
            .iter()
            .filter(|s| s.status == ScopeStatus::Failed)
    }

    /// Check if every processed scope committed
    pub fn is_success(&self) -> bool {
        self.failed_scopes().next().is_none() && !self.cancelled
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for scope in &self.scopes {
            let status = match scope.status {
                ScopeStatus::Committed => "committed",
                ScopeStatus::Failed => "FAILED",
                ScopeStatus::Skipped => "skipped",
                ScopeStatus::Cancelled => "cancelled",
            };
            write!(f, "{:<32} {:<10}", scope.scope, status)?;
            if scope.sections.is_empty() {
                match &scope.reason {
                    Some(reason) => writeln!(f, " {reason}")?,
                    None => writeln!(f)?,
                }
                continue;
            }
            writeln!(
                f,
                " {} written, {} unchanged",
                scope.committed_writes(),
                scope.unchanged()
            )?;
            for s in &scope.sections {
                writeln!(
                    f,
                    "    {:<28} {:>6} matched {:>6} written {:>6} read-only {:>6} absent",
                    s.label, s.candidates, s.writes, s.skipped_read_only, s.skipped_absent
                )?;
            }
            if let Some(SyncOutcome::Failed { reason }) = &scope.sync {
                writeln!(f, "    synchronize failed: {reason}")?;
            }
        }
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        if self.cancelled {
            writeln!(f, "run cancelled")?;
        }
        Ok(())
    }
}
