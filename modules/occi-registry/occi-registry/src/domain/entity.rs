//! Resource and Link admission.
//!
//! An entity is admitted only if every category it names exists with the
//! right type. Inline link descriptions on a resource become implicit Link
//! documents whose `source` is the resource.

use std::collections::HashSet;

use chrono::Utc;
use occi_registry_sdk::{
    EntityBody, EntityDocument, LinkDescription, LinkReference, ResourceDescription,
};
use tracing::{debug, error};
use uuid::Uuid;

use super::error::DomainError;
use super::joker;
use super::snapshot::EntitySnapshot;

/// A resource ready to persist, together with its implicit links.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmittedResource {
    pub resource: EntityDocument,
    pub links: Vec<EntityDocument>,
}

impl AdmittedResource {
    /// Locations of the implicit links, in declaration order.
    #[must_use]
    pub fn link_locations(&self) -> Vec<String> {
        self.links.iter().map(|l| l.location.clone()).collect()
    }
}

fn new_entity(creator: &str, location: String, body: EntityBody) -> EntityDocument {
    EntityDocument {
        id: Uuid::new_v4(),
        creator: creator.to_owned(),
        creation_date: Utc::now(),
        last_update: None,
        location,
        body,
    }
}

fn first_missing<'a>(ids: Option<&'a [String]>, exists: impl Fn(&str) -> bool) -> Option<&'a str> {
    ids.unwrap_or_default()
        .iter()
        .map(String::as_str)
        .find(|id| !exists(id))
}

/// Admission of Link entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkRegistry;

#[allow(clippy::unused_self)]
impl LinkRegistry {
    /// Prepares the implicit links declared inline on the resource at `source_location`.
    ///
    /// # Errors
    ///
    /// `NotFound` if a link kind, mixin, action or target resource is
    /// missing, `BadRequest` if a link has no target, `Conflict` if a link
    /// location is taken. The first failure rejects every link.
    pub fn admit_implicit_links(
        self,
        creator: &str,
        links: &[LinkDescription],
        source_location: &str,
        snapshot: &EntitySnapshot,
    ) -> Result<Vec<EntityDocument>, DomainError> {
        let mut batch_locations = HashSet::new();
        let mut prepared = Vec::with_capacity(links.len());

        for link in links {
            if link.id.trim_matches('/').is_empty() {
                error!(source = source_location, "Register link: id is empty");
                return Err(DomainError::bad_request("link id is empty"));
            }

            let Some(kind_location) = snapshot.kind_location(&link.kind) else {
                error!(kind = %link.kind, link = %link.id, "Register link: no such kind");
                return Err(DomainError::not_found(format!("Kind {} of link {}", link.kind, link.id)));
            };

            let Some(target) = link.target.as_deref() else {
                error!(link = %link.id, "Register link: target is missing");
                return Err(DomainError::bad_request(format!("link {} has no target", link.id)));
            };
            if target != source_location && !snapshot.has_resource(target) {
                error!(link = %link.id, %target, "Register link: target resource not found");
                return Err(DomainError::not_found(format!("target resource {target}")));
            }

            if let Some(missing) = first_missing(link.mixins.as_deref(), |id| snapshot.is_mixin(id))
                .or_else(|| first_missing(link.actions.as_deref(), |id| snapshot.is_action(id)))
            {
                error!(link = %link.id, %missing, "Register link: unknown mixin or action");
                return Err(DomainError::not_found(format!("category {missing}")));
            }

            let location = joker::link_location(creator, kind_location, &link.id);
            if snapshot.has_link(&location) || !batch_locations.insert(location.clone()) {
                error!(%location, "Register link: location conflict");
                return Err(DomainError::conflict(format!("link {location} already exists")));
            }

            let mut description = link.clone();
            description.source = Some(source_location.to_owned());
            debug!(%location, source = source_location, "Link document prepared");
            prepared.push(new_entity(creator, location, EntityBody::Link { description }));
        }

        Ok(prepared)
    }
}

/// Admission of Resource entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceRegistry {
    links: LinkRegistry,
}

impl ResourceRegistry {
    /// Validates `description` for creation under the Kind `kind_id` at `kind_location`.
    ///
    /// # Errors
    ///
    /// `BadRequest` if the description names another kind, `NotFound` for a
    /// missing action, mixin or link, `Conflict` if the resource location is
    /// taken, or any failure of its implicit links.
    pub fn admit(
        self,
        creator: &str,
        description: &ResourceDescription,
        kind_location: &str,
        kind_id: &str,
        snapshot: &EntitySnapshot,
    ) -> Result<AdmittedResource, DomainError> {
        if description.id.trim_matches('/').is_empty() {
            error!(kind = %description.kind, "Register resource: id is empty");
            return Err(DomainError::bad_request("resource id is empty"));
        }

        if description.kind != kind_id {
            error!(kind = %description.kind, expected = kind_id, "Register resource: kind and location don't match");
            return Err(DomainError::bad_request(format!(
                "resource {} is not of kind {kind_id}",
                description.id
            )));
        }

        if let Some(missing) = first_missing(description.actions.as_deref(), |id| snapshot.is_action(id)) {
            error!(resource = %description.id, %missing, "Register resource: problem in actions");
            return Err(DomainError::not_found(format!("Action {missing}")));
        }

        if let Some(missing) = first_missing(description.mixins.as_deref(), |id| snapshot.is_mixin(id)) {
            error!(resource = %description.id, %missing, "Register resource: problem in mixins");
            return Err(DomainError::not_found(format!("Mixin {missing}")));
        }

        let location = joker::resource_location(creator, kind_location, &description.id);

        let mut inline = Vec::new();
        for link in description.links.as_deref().unwrap_or_default() {
            match link {
                LinkReference::Location(existing) if snapshot.has_link(existing) => {
                    debug!(link = %existing, "Link verified");
                }
                LinkReference::Location(existing) => {
                    error!(link = %existing, "Register resource: no match to link");
                    return Err(DomainError::not_found(format!("link {existing}")));
                }
                LinkReference::Inline(link) => inline.push(link.clone()),
            }
        }

        if snapshot.has_resource(&location) {
            error!(%location, "Register resource: location conflict");
            return Err(DomainError::conflict(format!("resource {location} already exists")));
        }

        let links = self
            .links
            .admit_implicit_links(creator, &inline, &location, snapshot)?;

        let mut stored = description.clone();
        if let Some(refs) = stored.links.as_mut() {
            let mut created = links.iter().map(|l| l.location.clone());
            for slot in refs.iter_mut() {
                if matches!(slot, LinkReference::Inline(_))
                    && let Some(link_location) = created.next()
                {
                    *slot = LinkReference::Location(link_location);
                }
            }
        }

        debug!(%location, links = links.len(), "Resource document prepared");
        Ok(AdmittedResource {
            resource: new_entity(creator, location, EntityBody::Resource { description: stored }),
            links,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repo::ViewRow;
    use occi_registry_sdk::StatusCode;
    use serde_json::json;

    const COMPUTE: &str = "http://x/#compute";
    const LINK: &str = "http://x/#networkinterface";

    fn snapshot() -> EntitySnapshot {
        let categories = vec![
            ViewRow::new(COMPUTE, json!({"type": "Kind", "location": "/compute/"})),
            ViewRow::new(LINK, json!({"type": "Kind", "location": "/link/"})),
            ViewRow::new("http://x/#small", json!({"type": "Mixin", "location": "/small/"})),
            ViewRow::new("http://x/action#start", json!({"type": "Action"})),
        ];
        let resources = vec![ViewRow::new("/alice/compute/vm0", json!("alice"))];
        let links = vec![ViewRow::new("/alice/link/old", json!("alice"))];
        EntitySnapshot::from_rows(&categories, &resources, &links).unwrap()
    }

    fn admit(description: &ResourceDescription) -> Result<AdmittedResource, DomainError> {
        ResourceRegistry::default().admit("alice", description, "/compute/", COMPUTE, &snapshot())
    }

    #[test]
    fn test_admit_resource() {
        let description = ResourceDescription::new("vm1", COMPUTE)
            .with_mixins(vec!["http://x/#small".to_owned()])
            .with_actions(vec!["http://x/action#start".to_owned()])
            .with_links(vec![LinkReference::Location("/alice/link/old".to_owned())]);

        let admitted = admit(&description).unwrap();
        assert_eq!(admitted.resource.location, "/alice/compute/vm1");
        assert_eq!(admitted.resource.kind(), COMPUTE);
        assert!(admitted.links.is_empty());
    }

    #[test]
    fn test_kind_mismatch_is_bad_request() {
        let err = admit(&ResourceDescription::new("vm1", LINK)).unwrap_err();
        assert_eq!(err.status(), StatusCode::BadRequest);
    }

    #[test]
    fn test_empty_id_is_bad_request() {
        for id in ["", "/", "//"] {
            let err = admit(&ResourceDescription::new(id, COMPUTE)).unwrap_err();
            assert_eq!(err.status(), StatusCode::BadRequest);
        }
    }

    #[test]
    fn test_missing_references_are_not_found() {
        let cases = [
            ResourceDescription::new("vm1", COMPUTE)
                .with_actions(vec!["http://x/action#stop".to_owned()]),
            ResourceDescription::new("vm1", COMPUTE)
                .with_mixins(vec!["http://x/action#start".to_owned()]),
            ResourceDescription::new("vm1", COMPUTE)
                .with_links(vec![LinkReference::Location("/alice/link/ghost".to_owned())]),
        ];
        for description in &cases {
            assert_eq!(admit(description).unwrap_err().status(), StatusCode::NotFound);
        }
    }

    #[test]
    fn test_duplicate_location_conflicts() {
        let err = admit(&ResourceDescription::new("vm0", COMPUTE)).unwrap_err();
        assert_eq!(err.status(), StatusCode::Conflict);
    }

    #[test]
    fn test_inline_link_becomes_implicit_link() {
        let inline = LinkDescription::new("eth0", LINK).with_target("/alice/compute/vm0");
        let description = ResourceDescription::new("vm1", COMPUTE)
            .with_links(vec![LinkReference::Inline(inline)]);

        let admitted = admit(&description).unwrap();
        assert_eq!(admitted.link_locations(), vec!["/alice/link/eth0".to_owned()]);

        let EntityBody::Link { description: link } = &admitted.links[0].body else {
            panic!("Expected link body");
        };
        assert_eq!(link.source.as_deref(), Some("/alice/compute/vm1"));

        let EntityBody::Resource { description: stored } = &admitted.resource.body else {
            panic!("Expected resource body");
        };
        assert_eq!(
            stored.links,
            Some(vec![LinkReference::Location("/alice/link/eth0".to_owned())])
        );
    }

    #[test]
    fn test_inline_link_checks() {
        let no_target = LinkDescription::new("eth0", LINK);
        let bad_target = LinkDescription::new("eth0", LINK).with_target("/alice/compute/ghost");
        let bad_kind = LinkDescription::new("eth0", "http://x/#ghost").with_target("/alice/compute/vm0");
        let taken = LinkDescription::new("old", LINK).with_target("/alice/compute/vm0");

        let status = |link: LinkDescription| {
            admit(&ResourceDescription::new("vm1", COMPUTE).with_links(vec![LinkReference::Inline(link)]))
                .unwrap_err()
                .status()
        };
        assert_eq!(status(no_target), StatusCode::BadRequest);
        assert_eq!(
            status(LinkDescription::new("/", LINK).with_target("/alice/compute/vm0")),
            StatusCode::BadRequest
        );
        assert_eq!(status(bad_target), StatusCode::NotFound);
        assert_eq!(status(bad_kind), StatusCode::NotFound);
        assert_eq!(status(taken), StatusCode::Conflict);
    }
}
