//! Identity joker: canonical identifiers and locations, membership checks.
//!
//! Pure functions over in-memory snapshots supplied by the caller.

use std::collections::HashSet;
use std::hash::BuildHasher;

use occi_registry_sdk::{CategoryDescription, CategoryFields};

/// Canonical category identifier: `scheme` immediately followed by `term`.
#[must_use]
pub fn compute_occi_id<D: CategoryFields + ?Sized>(description: &D) -> String {
    format!("{}{}", description.scheme(), description.term())
}

/// Location of a Kind or Mixin.
///
/// A declared location is normalized to start and end with `/`. Without one,
/// the location is `<root><term>/`.
#[must_use]
pub fn compute_location(description: &CategoryDescription, root: &str) -> String {
    match description.location.as_deref() {
        Some(declared) => normalize_location(declared),
        None => format!("{}{}/", normalize_location(root), description.term),
    }
}

/// Location of a resource: `/<creator>/<kind location>/<local id>`.
#[must_use]
pub fn resource_location(creator: &str, kind_location: &str, local_id: &str) -> String {
    entity_location(creator, kind_location, local_id)
}

/// Location of a link: `/<creator>/<kind location>/<local id>`.
#[must_use]
pub fn link_location(creator: &str, kind_location: &str, local_id: &str) -> String {
    entity_location(creator, kind_location, local_id)
}

fn entity_location(creator: &str, kind_location: &str, local_id: &str) -> String {
    let kind_path = kind_location.trim_matches('/');
    let local_id = local_id.trim_matches('/');
    if kind_path.is_empty() {
        format!("/{creator}/{local_id}")
    } else {
        format!("/{creator}/{kind_path}/{local_id}")
    }
}

fn normalize_location(location: &str) -> String {
    let trimmed = location.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        format!("/{trimmed}/")
    }
}

/// Returns `true` if `candidate` is not yet in `existing`.
#[must_use]
pub fn is_unique<S: BuildHasher>(candidate: &str, existing: &HashSet<String, S>) -> bool {
    !existing.contains(candidate)
}

/// Returns `true` if `candidate` is in `existing`.
#[must_use]
pub fn exists_among<S: BuildHasher>(candidate: &str, existing: &HashSet<String, S>) -> bool {
    existing.contains(candidate)
}

/// First related category identifier of `description` absent from `existing`.
#[must_use]
pub fn missing_related<'a, S: BuildHasher>(
    description: &'a CategoryDescription,
    existing: &HashSet<String, S>,
) -> Option<&'a str> {
    description
        .related()
        .iter()
        .find(|id| !exists_among(id, existing))
        .map(String::as_str)
}

/// First action identifier of `description` absent from `existing`.
#[must_use]
pub fn missing_action<'a, S: BuildHasher>(
    description: &'a CategoryDescription,
    existing: &HashSet<String, S>,
) -> Option<&'a str> {
    description
        .declared_actions()
        .iter()
        .find(|id| !exists_among(id, existing))
        .map(String::as_str)
}
