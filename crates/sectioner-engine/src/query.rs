// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only queries over classified scopes

use crate::candidates::Eligibility;
use sectioner_model::{Document, ElementId};
use std::collections::BTreeMap;

/// Eligible instances whose `attribute` equals `section`
pub fn find_by_section(
    doc: &dyn Document,
    attribute: &str,
    section: &str,
    eligibility: &Eligibility,
) -> Vec<ElementId> {
    doc.instance_ids()
        .into_iter()
        .filter_map(|id| doc.element(id))
        .filter(|e| eligibility.accepts(e) && e.attribute_str(attribute) == Some(section))
        .map(|e| e.id)
        .collect()
}

/// Number of eligible instances per value of `attribute`
///
/// Instances without a value are counted under the empty string.
pub fn section_census(
    doc: &dyn Document,
    attribute: &str,
    eligibility: &Eligibility,
) -> BTreeMap<String, usize> {
    let mut census = BTreeMap::new();
    for element in doc
        .instance_ids()
        .into_iter()
        .filter_map(|id| doc.element(id))
        .filter(|e| eligibility.accepts(e))
    {
        let value = element.attribute_str(attribute).unwrap_or_default();
        *census.entry(value.to_string()).or_insert(0) += 1;
    }
    census
}
