// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Federation controller
//!
//! Runs the classification driver over the primary document and then over
//! each linked document in enumeration order:
//!
//! 1. skip links whose file reference does not resolve
//! 2. unload loaded top-level links (nested links are left alone)
//! 3. open the linked document with every workset
//! 4. classify it
//! 5. synchronize with the central copy (failures are warnings)
//! 6. close it without saving a local copy
//! 7. reload every link unloaded in step 2
//!
//! A failing link never affects the scopes processed before or after it.

use crate::cancel::CancellationToken;
use crate::driver::ClassificationDriver;
use crate::error::EngineError;
use crate::registry::SectionRegistry;
use crate::report::{RunReport, ScopeOrigin, ScopeReport, SyncOutcome};
use crate::ClassificationConfig;
use sectioner_model::{LinkId, LinkReference, ModelError, ModelHost};

/// Links unloaded during a run, reloaded when the guard ends
///
/// Reloading happens in [`LinkReloadGuard::finish`] or, if the guard is
/// dropped without finishing, in `Drop`.
pub struct LinkReloadGuard<'a> {
    host: &'a mut dyn ModelHost,
    unloaded: Vec<LinkId>,
    reload: bool,
}

/// Result of reloading links
#[derive(Debug, Default)]
pub struct ReloadSummary {
    pub reloaded: Vec<LinkId>,
    pub warnings: Vec<String>,
}

impl<'a> LinkReloadGuard<'a> {
    /// Wrap `host`; with `reload == false` unloaded links stay unloaded
    pub fn new(host: &'a mut dyn ModelHost, reload: bool) -> Self {
        Self {
            host,
            unloaded: Vec::new(),
            reload,
        }
    }

    /// The wrapped host
    pub fn host(&mut self) -> &mut dyn ModelHost {
        &mut *self.host
    }

    /// Unload a link and remember it
    pub fn unload(&mut self, id: LinkId) -> Result<(), ModelError> {
        self.host.unload_link(id)?;
        self.unloaded.push(id);
        Ok(())
    }

    /// Links currently unloaded by this guard
    pub fn unloaded(&self) -> &[LinkId] {
        &self.unloaded
    }

    /// Reload every unloaded link now
    pub fn finish(mut self) -> ReloadSummary {
        self.reload_all()
    }

    fn reload_all(&mut self) -> ReloadSummary {
        let mut summary = ReloadSummary::default();
        if !self.reload {
            self.unloaded.clear();
            return summary;
        }
        for id in std::mem::take(&mut self.unloaded) {
            match self.host.reload_link(id) {
                Ok(()) => summary.reloaded.push(id),
                Err(e) => {
                    log::warn!("Failed to reload {id}: {e}");
                    summary.warnings.push(format!("failed to reload {id}: {e}"));
                }
            }
        }
        summary
    }
}

impl Drop for LinkReloadGuard<'_> {
    fn drop(&mut self) {
        if !self.unloaded.is_empty() {
            self.reload_all();
        }
    }
}

/// Drives a classification run across the primary document and its links
pub struct FederationController<'a> {
    registry: &'a SectionRegistry,
    config: &'a ClassificationConfig,
    cancel: CancellationToken,
}

impl<'a> FederationController<'a> {
    /// Create a controller for a registry and configuration
    pub fn new(registry: &'a SectionRegistry, config: &'a ClassificationConfig) -> Self {
        Self {
            registry,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Check `token` between scopes and sections
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Classify every scope of `host`
    pub fn run(&self, host: &mut dyn ModelHost) -> RunReport {
        let driver = ClassificationDriver::new(self.registry, self.config)
            .with_cancellation(self.cancel.clone());
        let federation = &self.config.federation;
        let mut report = RunReport::default();

        if federation.process_primary {
            let scope = if self.cancel.is_cancelled() {
                ScopeReport::cancelled(host.primary().name(), ScopeOrigin::Primary)
            } else {
                driver.classify(host.primary_mut(), ScopeOrigin::Primary)
            };
            report.scopes.push(scope);
        }

        let links = host.links();
        let mut guard = LinkReloadGuard::new(host, federation.reload_links);
        for link in &links {
            let origin = ScopeOrigin::Link { id: link.id };
            if self.cancel.is_cancelled() {
                report.scopes.push(ScopeReport::cancelled(&link.name, origin));
                continue;
            }
            if let Some(filter) = &federation.link_name_contains {
                if !link.name.contains(filter.as_str()) {
                    log::debug!("{}: filtered out by name", link.name);
                    report
                        .scopes
                        .push(ScopeReport::skipped(&link.name, origin, "filtered by name"));
                    continue;
                }
            }
            let scope = self.process_link(&mut guard, &driver, link, &mut report.warnings);
            report.scopes.push(scope);
        }

        let reload = guard.finish();
        report.reloaded_links = reload.reloaded;
        report.warnings.extend(reload.warnings);
        report.cancelled = self.cancel.is_cancelled();
        if report.cancelled {
            log::warn!("Run cancelled; committed scopes are kept");
        }
        report
    }

    fn process_link(
        &self,
        guard: &mut LinkReloadGuard<'_>,
        driver: &ClassificationDriver<'_>,
        link: &LinkReference,
        warnings: &mut Vec<String>,
    ) -> ScopeReport {
        let federation = &self.config.federation;
        let origin = ScopeOrigin::Link { id: link.id };

        if !link.is_resolved() {
            log::info!("{}: external reference unresolved, skipped", link.name);
            return ScopeReport::skipped(&link.name, origin, "unresolved reference");
        }

        if link.needs_unload() {
            if let Err(e) = guard.unload(link.id) {
                let message = format!("{}: failed to unload: {e}", link.name);
                log::warn!("{message}");
                warnings.push(message.clone());
                return ScopeReport::failed(&link.name, origin, message);
            }
        }

        let mut doc = match guard.host().open_link(link, &federation.open) {
            Ok(doc) => doc,
            Err(source) => {
                let err = EngineError::ScopeOpen {
                    scope: link.name.clone(),
                    source,
                };
                log::warn!("{err}");
                warnings.push(err.to_string());
                return ScopeReport::failed(&link.name, origin, err.to_string());
            }
        };

        let mut scope = driver.classify(&mut *doc, origin);

        if federation.synchronize && scope.committed_writes() > 0 {
            scope.sync = Some(match guard.host().synchronize(&mut *doc) {
                Ok(()) => SyncOutcome::Synchronized,
                Err(e) => {
                    log::warn!("{}: synchronize failed: {e}", scope.scope);
                    warnings.push(format!("{}: synchronize failed: {e}", scope.scope));
                    SyncOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            });
        }

        if let Err(e) = guard.host().close_document(doc, false) {
            log::warn!("{}: close failed: {e}", scope.scope);
            warnings.push(format!("{}: close failed: {e}", scope.scope));
        }
        scope
    }
}
