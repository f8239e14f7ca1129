// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model host over a central store

use crate::central::{CentralStore, InMemoryCentral, SharedStore};
use crate::data::DocumentData;
use crate::document::MemoryDocument;
use rustc_hash::FxHashMap;
use sectioner_model::{
    Document, LinkId, LinkReference, ModelError, ModelHost, OpenOptions, Result,
};
use std::cell::RefCell;
use std::path::{Component, Path};
use std::rc::Rc;

/// Host-side effect, recorded in call order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEvent {
    Unloaded(LinkId),
    Reloaded(LinkId),
    Opened(String),
    Synchronized(String),
    Closed { name: String, saved: bool },
}

/// Host owning an in-memory primary document
///
/// Linked documents are loaded from the central store when opened. Each
/// commit on an opened link is written through to the host's local store,
/// and synchronize pushes the committed state to the central copy.
#[derive(Debug)]
pub struct MemoryHost<C = InMemoryCentral> {
    primary: MemoryDocument,
    links: Vec<LinkReference>,
    central: C,
    local: SharedStore,
    opened: FxHashMap<String, String>,
    events: Vec<HostEvent>,
}

impl<C: CentralStore> MemoryHost<C> {
    /// Create a host without links
    pub fn new(primary: MemoryDocument, central: C) -> Self {
        Self {
            primary,
            links: Vec::new(),
            central,
            local: Rc::new(RefCell::new(InMemoryCentral::new())),
            opened: FxHashMap::default(),
            events: Vec::new(),
        }
    }

    /// Create a host from a serialized primary document and its links
    pub fn from_data(data: DocumentData, central: C) -> Self {
        let links = data.links.clone();
        let mut host = Self::new(MemoryDocument::from_data(data), central);
        host.links = links;
        host
    }

    /// Declare a link
    pub fn with_link(mut self, link: LinkReference) -> Self {
        self.links.push(link);
        self
    }

    /// Keep local copies of opened links in `store` (in memory by default)
    pub fn with_local_store(mut self, store: impl CentralStore + 'static) -> Self {
        self.local = Rc::new(RefCell::new(store));
        self
    }

    /// Last committed local state of the link document at `path`
    pub fn local_copy(&self, path: &str) -> Option<DocumentData> {
        self.local.borrow().load(&local_key(path)).ok()
    }

    /// Serialize the primary document with its links
    pub fn to_data(&self) -> DocumentData {
        DocumentData {
            links: self.links.clone(),
            ..self.primary.to_data()
        }
    }

    /// The primary document
    pub fn primary_document(&self) -> &MemoryDocument {
        &self.primary
    }

    /// The central store
    pub fn central(&self) -> &C {
        &self.central
    }

    /// Mutable access to the central store
    pub fn central_mut(&mut self) -> &mut C {
        &mut self.central
    }

    /// Declared link by id
    pub fn link(&self, id: LinkId) -> Option<&LinkReference> {
        self.links.iter().find(|l| l.id == id)
    }

    /// Effects in call order
    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    fn set_loaded(&mut self, id: LinkId, loaded: bool) -> Result<()> {
        let link = self
            .links
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(ModelError::LinkNotFound(id))?;
        link.loaded = loaded;
        Ok(())
    }
}

impl<C: CentralStore> ModelHost for MemoryHost<C> {
    fn primary(&self) -> &dyn Document {
        &self.primary
    }

    fn primary_mut(&mut self) -> &mut dyn Document {
        &mut self.primary
    }

    fn links(&self) -> Vec<LinkReference> {
        self.links.clone()
    }

    fn unload_link(&mut self, id: LinkId) -> Result<()> {
        self.set_loaded(id, false)?;
        self.events.push(HostEvent::Unloaded(id));
        Ok(())
    }

    fn reload_link(&mut self, id: LinkId) -> Result<()> {
        self.set_loaded(id, true)?;
        self.events.push(HostEvent::Reloaded(id));
        Ok(())
    }

    fn open_link(
        &mut self,
        link: &LinkReference,
        options: &OpenOptions,
    ) -> Result<Box<dyn Document>> {
        let path = match link.path.as_deref() {
            Some(path) if !path.is_empty() => path,
            _ => return Err(ModelError::open_failed(&link.name, "unresolved reference")),
        };
        let mut data = self
            .central
            .load(path)
            .map_err(|e| ModelError::open_failed(&link.name, e.to_string()))?;
        if data.name.is_empty() {
            data.name = link.name.clone();
        }
        if self.opened.contains_key(&data.name) {
            return Err(ModelError::open_failed(&link.name, "document is already open"));
        }
        log::debug!(
            "Opening '{}' from {} (all worksets: {})",
            data.name,
            path,
            options.all_worksets
        );

        self.opened.insert(data.name.clone(), path.to_string());
        self.events.push(HostEvent::Opened(data.name.clone()));
        let doc =
            MemoryDocument::from_data(data).backed_by(Rc::clone(&self.local), local_key(path));
        Ok(Box::new(doc))
    }

    fn close_document(&mut self, mut doc: Box<dyn Document>, save_local_copy: bool) -> Result<()> {
        if doc.has_open_batch() {
            log::warn!("{}: closing with an open batch; rolling back", doc.name());
            doc.rollback_batch();
        }
        let name = doc.name().to_string();
        let path = self.opened.remove(&name);
        if save_local_copy {
            let path = path.ok_or_else(|| ModelError::other(format!("{name} was not opened")))?;
            self.central
                .store(&format!("{path}.local"), &DocumentData::capture(&*doc))?;
        }
        self.events.push(HostEvent::Closed {
            name,
            saved: save_local_copy,
        });
        Ok(())
    }

    fn synchronize(&mut self, doc: &mut dyn Document) -> Result<()> {
        let name = doc.name().to_string();
        if doc.has_open_batch() {
            return Err(ModelError::sync_failed(name, "a batch is still open"));
        }
        let Some(path) = self.opened.get(&name).cloned() else {
            return Err(ModelError::sync_failed(name, "not opened from the central store"));
        };

        let mut data = self
            .central
            .load(&path)
            .map_err(|e| ModelError::sync_failed(&name, e.to_string()))?;
        data.elements = DocumentData::capture(doc).elements;
        self.central
            .store(&path, &data)
            .map_err(|e| ModelError::sync_failed(&name, e.to_string()))?;

        self.events.push(HostEvent::Synchronized(name));
        Ok(())
    }
}

/// Local store key for a link reference: its normal path components only,
/// so absolute references stay inside the local store
fn local_key(path: &str) -> String {
    Path::new(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sectioner_model::{Attribute, AttributeValue, Element, ElementId};

    fn link_data() -> DocumentData {
        DocumentData {
            name: "AR".into(),
            elements: vec![Element::new(1u64).with_attribute(Attribute::empty("Zone"))],
            ..Default::default()
        }
    }

    fn host() -> MemoryHost {
        let central = InMemoryCentral::new().with_document("ar.json", link_data());
        MemoryHost::new(MemoryDocument::new("Primary"), central)
            .with_link(LinkReference::new(1, "AR", "ar.json"))
            .with_link(LinkReference::unresolved(2, "Gone"))
    }

    #[test]
    fn test_open_sync_close() {
        let mut host = host();
        let link = host.links()[0].clone();
        let mut doc = host.open_link(&link, &OpenOptions::default()).unwrap();

        doc.begin_batch("t").unwrap();
        doc.set_attribute(ElementId(1), "Zone", "A".into()).unwrap();
        doc.commit_batch().unwrap();
        host.synchronize(&mut *doc).unwrap();
        host.close_document(doc, false).unwrap();

        let central = host.central().document("ar.json").unwrap();
        assert_eq!(
            central.elements[0].attribute("Zone").attribute().unwrap().value,
            AttributeValue::from("A")
        );
        assert!(!host.central().exists("ar.json.local"));
        assert_eq!(
            host.events(),
            &[
                HostEvent::Opened("AR".into()),
                HostEvent::Synchronized("AR".into()),
                HostEvent::Closed {
                    name: "AR".into(),
                    saved: false
                },
            ]
        );
    }

    #[test]
    fn test_open_failures() {
        let mut host = host();
        let gone = host.links()[1].clone();
        assert!(matches!(
            host.open_link(&gone, &OpenOptions::default()),
            Err(ModelError::OpenFailed { .. })
        ));

        let missing = LinkReference::new(3, "KR", "kr.json");
        assert!(matches!(
            host.open_link(&missing, &OpenOptions::default()),
            Err(ModelError::OpenFailed { .. })
        ));
    }

    fn zone(data: &DocumentData) -> Option<&str> {
        data.elements[0].attribute_str("Zone")
    }

    #[test]
    fn test_commit_is_kept_locally_without_sync() {
        let mut host = host();
        let link = host.links()[0].clone();
        let mut doc = host.open_link(&link, &OpenOptions::default()).unwrap();

        doc.begin_batch("t").unwrap();
        doc.set_attribute(ElementId(1), "Zone", "A".into()).unwrap();
        doc.commit_batch().unwrap();
        host.close_document(doc, false).unwrap();

        assert_eq!(zone(&host.local_copy("ar.json").unwrap()), Some("A"));
        assert_eq!(zone(host.central().document("ar.json").unwrap()), None);
    }

    #[test]
    fn test_sync_failure_keeps_local_commit() {
        let mut host = host();
        host.central_mut().set_read_only("ar.json");
        let link = host.links()[0].clone();
        let mut doc = host.open_link(&link, &OpenOptions::default()).unwrap();

        doc.begin_batch("t").unwrap();
        doc.set_attribute(ElementId(1), "Zone", "A".into()).unwrap();
        doc.commit_batch().unwrap();
        let err = host.synchronize(&mut *doc).unwrap_err();
        assert!(matches!(err, ModelError::SyncFailed { .. }));
        host.close_document(doc, false).unwrap();

        assert_eq!(zone(&host.local_copy("ar.json").unwrap()), Some("A"));
        assert_eq!(zone(host.central().document("ar.json").unwrap()), None);
    }

    #[test]
    fn test_local_key_strips_roots() {
        assert_eq!(local_key("ar.json"), "ar.json");
        assert_eq!(local_key("/srv/models/ar.json"), "srv/models/ar.json");
        assert_eq!(local_key("./links/kr.json"), "links/kr.json");
    }

    #[test]
    fn test_unload_and_reload() {
        let mut host = host();
        host.unload_link(LinkId(1)).unwrap();
        assert!(!host.link(LinkId(1)).unwrap().loaded);
        host.reload_link(LinkId(1)).unwrap();
        assert!(host.link(LinkId(1)).unwrap().loaded);
        assert!(matches!(
            host.unload_link(LinkId(9)),
            Err(ModelError::LinkNotFound(_))
        ));
    }

    #[test]
    fn test_to_data_includes_links() {
        let data = host().to_data();
        assert_eq!(data.name, "Primary");
        assert_eq!(data.links.len(), 2);
    }
}
