// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Classification driver
//!
//! Classifies one scope against every registered section. Each section moves
//! through `Idle -> CandidatesBuilt -> AttributesAssigned -> Committed`
//! (or `Failed`).
//!
//! All candidate sets are built, and the winning section of every element is
//! resolved, before any batch opens. Batches only hold writes that change a
//! value, so a repeated run issues no writes.

use crate::batch::BatchGuard;
use crate::cancel::CancellationToken;
use crate::candidates::{build_candidates, Eligibility};
use crate::config::{BatchGranularity, ClassificationConfig, MatchPolicy};
use crate::error::EngineError;
use crate::registry::{SectionEntry, SectionRegistry};
use crate::report::{BatchState, ScopeOrigin, ScopeReport, ScopeStatus, SectionOutcome};
use rustc_hash::FxHashMap;
use sectioner_model::{AttributeSlot, AttributeValue, Document, ElementId, ModelError};

/// Writes planned for one section in one scope
struct SectionPlan<'r> {
    entry: &'r SectionEntry,
    matched: Vec<ElementId>,
    writes: Vec<ElementId>,
    outcome: SectionOutcome,
}

/// Applies a section registry to document scopes
pub struct ClassificationDriver<'a> {
    registry: &'a SectionRegistry,
    config: &'a ClassificationConfig,
    eligibility: Eligibility,
    cancel: CancellationToken,
}

impl<'a> ClassificationDriver<'a> {
    /// Create a driver for a registry and configuration
    pub fn new(registry: &'a SectionRegistry, config: &'a ClassificationConfig) -> Self {
        Self {
            registry,
            config,
            eligibility: Eligibility::from_config(config),
            cancel: CancellationToken::new(),
        }
    }

    /// Check `token` between sections
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Classify every eligible element of `doc`
    ///
    /// Never returns an error: failures are recorded in the report and only
    /// affect this scope.
    pub fn classify(&self, doc: &mut dyn Document, origin: ScopeOrigin) -> ScopeReport {
        let mut report = ScopeReport::new(doc.name(), origin);

        let Some(mut plans) = self.plan(&*doc) else {
            log::warn!("{}: cancelled before writing", report.scope);
            report.status = ScopeStatus::Cancelled;
            return report;
        };

        let result = match self.config.batch_granularity {
            BatchGranularity::PerSection => self.apply_per_section(doc, &mut plans),
            BatchGranularity::PerScope => {
                let label = format!("Sectioner: {} section(s)", plans.len());
                self.write_batch(doc, &label, &mut plans)
            }
        };

        match result {
            Ok(true) => {}
            Ok(false) => {
                log::warn!("{}: cancelled between sections", report.scope);
                report.status = ScopeStatus::Cancelled;
            }
            Err(err) => {
                log::warn!("{err}");
                report.status = ScopeStatus::Failed;
                report.reason = Some(err.to_string());
            }
        }

        report.sections = plans.into_iter().map(|p| p.outcome).collect();
        log::info!(
            "{}: {} write(s) committed, {} unchanged across {} section(s)",
            report.scope,
            report.committed_writes(),
            report.unchanged(),
            report.sections.len()
        );
        report
    }

    /// Build candidate sets and decide the writes of every section
    ///
    /// Returns `None` if cancelled.
    fn plan(&self, doc: &dyn Document) -> Option<Vec<SectionPlan<'a>>> {
        let scope = doc.name();
        let mut plans = Vec::with_capacity(self.registry.len());

        for entry in self.registry.entries() {
            if self.cancel.is_cancelled() {
                return None;
            }
            let test = entry.scoped(&self.config.predicate, scope);
            let matched = build_candidates(doc, &test, &self.eligibility);
            log::debug!(
                "{}: section '{}' (form {}) matched {} element(s)",
                scope,
                entry.label,
                entry.form_id,
                matched.len()
            );

            let mut outcome = SectionOutcome::new(entry);
            outcome.candidates = matched.len();
            outcome.state = BatchState::CandidatesBuilt;
            plans.push(SectionPlan {
                entry,
                matched,
                writes: Vec::new(),
                outcome,
            });
        }

        let winners = self.resolve_winners(&plans);
        let target = self.config.target_attribute.as_str();

        for (index, plan) in plans.iter_mut().enumerate() {
            let SectionPlan {
                entry,
                matched,
                writes,
                outcome,
            } = plan;

            for id in matched.iter() {
                if winners.get(id) != Some(&index) {
                    outcome.superseded += 1;
                    continue;
                }
                let Some(element) = doc.element(*id) else {
                    continue;
                };
                match element.attribute(target) {
                    AttributeSlot::Absent => {
                        log::trace!("{}: {} has no '{}'", scope, id, target);
                        outcome.skipped_absent += 1;
                    }
                    AttributeSlot::ReadOnly(_) => {
                        log::trace!("{}: {} '{}' is read-only", scope, id, target);
                        outcome.skipped_read_only += 1;
                    }
                    AttributeSlot::Writable(attr) => {
                        if attr.value.as_string() == Some(entry.label.as_str()) {
                            outcome.unchanged += 1;
                        } else {
                            writes.push(*id);
                        }
                    }
                }
            }
        }

        Some(plans)
    }

    /// Section index that writes each matched element
    fn resolve_winners(&self, plans: &[SectionPlan<'_>]) -> FxHashMap<ElementId, usize> {
        let mut winners = FxHashMap::default();
        for (index, plan) in plans.iter().enumerate() {
            for id in &plan.matched {
                match self.config.match_policy {
                    MatchPolicy::LastMatchWins => {
                        winners.insert(*id, index);
                    }
                    MatchPolicy::FirstMatchWins => {
                        winners.entry(*id).or_insert(index);
                    }
                }
            }
        }
        winners
    }

    /// One batch per section; stops at the first failure
    ///
    /// Returns `Ok(false)` if cancelled between sections.
    fn apply_per_section(
        &self,
        doc: &mut dyn Document,
        plans: &mut [SectionPlan<'_>],
    ) -> Result<bool, EngineError> {
        for index in 0..plans.len() {
            if self.cancel.is_cancelled() {
                return Ok(false);
            }
            let label = format!("Sectioner: {}", plans[index].entry.label);
            self.write_batch(doc, &label, &mut plans[index..=index])?;
        }
        Ok(true)
    }

    /// Write `plans` in one batch and commit it
    fn write_batch(
        &self,
        doc: &mut dyn Document,
        label: &str,
        plans: &mut [SectionPlan<'_>],
    ) -> Result<bool, EngineError> {
        if plans.iter().all(|p| p.writes.is_empty()) {
            for plan in plans.iter_mut() {
                plan.outcome.state = BatchState::Committed;
            }
            return Ok(true);
        }

        let scope = doc.name().to_string();
        let target = self.config.target_attribute.as_str();
        let mut batch = BatchGuard::begin(doc, label).map_err(|source| EngineError::Begin {
            scope: scope.clone(),
            source,
        })?;

        for plan in plans.iter_mut() {
            let SectionPlan {
                entry,
                writes,
                outcome,
                ..
            } = plan;
            let mut issued = 0;
            for id in writes.iter() {
                match batch.set(*id, target, AttributeValue::from(entry.label.as_str())) {
                    Ok(()) => issued += 1,
                    Err(ModelError::ElementNotFound { .. } | ModelError::AttributeNotFound { .. }) => {
                        outcome.skipped_absent += 1;
                    }
                    Err(ModelError::ReadOnlyAttribute { .. }) => {
                        outcome.skipped_read_only += 1;
                    }
                    Err(source) => {
                        outcome.state = BatchState::Failed;
                        return Err(EngineError::Write { scope, source });
                    }
                }
            }
            outcome.writes = issued;
            outcome.state = BatchState::AttributesAssigned;
        }

        match batch.commit() {
            Ok(()) => {
                for plan in plans.iter_mut() {
                    plan.outcome.state = BatchState::Committed;
                }
                Ok(true)
            }
            Err(source) => {
                for plan in plans.iter_mut() {
                    plan.outcome.state = BatchState::Failed;
                }
                Err(EngineError::Commit { scope, source })
            }
        }
    }
}
