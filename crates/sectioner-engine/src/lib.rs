// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Sectioner Engine
//!
//! Assigns section (building block / zone) identifiers to building-model
//! elements. Section forms in the primary document define reference volumes;
//! every eligible element inside a volume gets the form's label written to a
//! target attribute, in the primary document and in every linked document.
//!
//! ## Overview
//!
//! - **Registry**: one entry per labelled section form, with prebuilt
//!   containment predicates
//! - **Candidates**: spatial pre-filter, containment test and eligibility
//!   filter per section and scope
//! - **Driver**: resolves which section writes each element and applies the
//!   writes in atomic batches
//! - **Federation**: opens, classifies, synchronizes and closes linked
//!   documents, reloading unloaded links afterwards
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sectioner_engine::{classify, ClassificationConfig};
//!
//! let config = ClassificationConfig::load(Path::new("sectioner.toml"))?;
//! let report = classify(&mut host, &config)?;
//! println!("{report}");
//! ```

pub mod batch;
pub mod cancel;
pub mod candidates;
pub mod config;
pub mod driver;
pub mod error;
pub mod federation;
pub mod query;
pub mod registry;
pub mod report;

pub use batch::BatchGuard;
pub use cancel::CancellationToken;
pub use candidates::{build_candidates, CandidateTest, Eligibility};
pub use config::{
    BatchGranularity, ClassificationConfig, EligibilityConfig, FederationConfig, LabelSource,
    MatchPolicy, PredicateConfig, PredicateOverride,
};
pub use driver::ClassificationDriver;
pub use error::{EngineError, Result};
pub use federation::{FederationController, LinkReloadGuard, ReloadSummary};
pub use query::{find_by_section, section_census};
pub use registry::{ScopedPredicate, SectionEntry, SectionRegistry};
pub use report::{
    BatchState, RunReport, ScopeOrigin, ScopeReport, ScopeStatus, SectionOutcome, SyncOutcome,
};

// Re-export the predicate vocabulary used in configuration
pub use sectioner_geometry::{ContainmentPredicate, PredicateKind};

use sectioner_model::ModelHost;

/// Build the section registry from the primary document and classify every scope
pub fn classify(host: &mut dyn ModelHost, config: &ClassificationConfig) -> Result<RunReport> {
    classify_with_cancellation(host, config, CancellationToken::new())
}

/// [`classify`] with a cancellation token checked between scopes and sections
pub fn classify_with_cancellation(
    host: &mut dyn ModelHost,
    config: &ClassificationConfig,
    cancel: CancellationToken,
) -> Result<RunReport> {
    config.validate()?;
    let registry = SectionRegistry::build(host.primary(), config);
    if registry.is_empty() {
        log::warn!("{}: no labelled section forms found", host.primary().name());
    }
    Ok(FederationController::new(&registry, config)
        .with_cancellation(cancel)
        .run(host))
}
