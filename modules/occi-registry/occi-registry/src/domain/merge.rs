//! Field-level merge of stored descriptions and providers.
//!
//! An update may only replace fields the stored description already carries.
//! `term` and `scheme` identify the document and are left untouched.

use occi_registry_sdk::{ActionDescription, CategoryDescription, Provider, ProviderUpdate};
use thiserror::Error;

/// Reasons a merge cannot be fully applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("fields absent from the stored description: {}", .0.join(", "))]
    UnknownFields(Vec<&'static str>),

    #[error("provider update names neither local nor remote")]
    EmptyProviderUpdate,

    #[error("provider identifiers must not be empty")]
    EmptyIdentifier,
}

fn merge_field<T: Clone>(
    name: &'static str,
    old: &mut Option<T>,
    new: Option<&T>,
    unknown: &mut Vec<&'static str>,
) {
    match (old.as_mut(), new) {
        (Some(slot), Some(value)) => *slot = value.clone(),
        (None, Some(_)) => unknown.push(name),
        (_, None) => {}
    }
}

/// Merges `update` into `stored`, all-or-nothing.
///
/// # Errors
///
/// Returns `MergeError::UnknownFields` if `update` sets a field `stored` lacks;
/// `stored` is left unchanged in that case.
pub fn merge_category_description(
    stored: &CategoryDescription,
    update: &CategoryDescription,
) -> Result<CategoryDescription, MergeError> {
    let mut merged = stored.clone();
    let mut unknown = Vec::new();
    merge_field("title", &mut merged.title, update.title.as_ref(), &mut unknown);
    merge_field("related", &mut merged.related, update.related.as_ref(), &mut unknown);
    merge_field(
        "attributes",
        &mut merged.attributes,
        update.attributes.as_ref(),
        &mut unknown,
    );
    merge_field("actions", &mut merged.actions, update.actions.as_ref(), &mut unknown);
    merge_field("location", &mut merged.location, update.location.as_ref(), &mut unknown);

    if unknown.is_empty() {
        Ok(merged)
    } else {
        Err(MergeError::UnknownFields(unknown))
    }
}

/// Action counterpart of [`merge_category_description`].
///
/// # Errors
///
/// Returns `MergeError::UnknownFields` if `update` sets a field `stored` lacks.
pub fn merge_action_description(
    stored: &ActionDescription,
    update: &ActionDescription,
) -> Result<ActionDescription, MergeError> {
    let mut merged = stored.clone();
    let mut unknown = Vec::new();
    merge_field("title", &mut merged.title, update.title.as_ref(), &mut unknown);
    merge_field(
        "attributes",
        &mut merged.attributes,
        update.attributes.as_ref(),
        &mut unknown,
    );

    if unknown.is_empty() {
        Ok(merged)
    } else {
        Err(MergeError::UnknownFields(unknown))
    }
}

/// Unions the identifiers of `update` into the stored provider sets.
///
/// # Errors
///
/// Returns `MergeError` if the update names no set or carries an empty identifier.
pub fn merge_provider(stored: &Provider, update: &ProviderUpdate) -> Result<Provider, MergeError> {
    if update.local.is_none() && update.remote.is_none() {
        return Err(MergeError::EmptyProviderUpdate);
    }

    let mut incoming = update.local.iter().chain(update.remote.iter()).flatten();
    if incoming.any(|id| id.trim().is_empty()) {
        return Err(MergeError::EmptyIdentifier);
    }

    let mut merged = stored.clone();
    if let Some(local) = &update.local {
        merged.local.extend(local.iter().cloned());
    }
    if let Some(remote) = &update.remote {
        merged.remote.extend(remote.iter().cloned());
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored() -> CategoryDescription {
        CategoryDescription::new("compute", "http://x/#")
            .with_title("Compute")
            .with_attributes(json!({"occi.compute.cores": {"required": false}}))
    }

    #[test]
    fn test_merge_replaces_present_fields() {
        let update = CategoryDescription::new("compute", "http://x/#").with_title("VM");
        let merged = merge_category_description(&stored(), &update).unwrap();
        assert_eq!(merged.title.as_deref(), Some("VM"));
        assert_eq!(merged.attributes, stored().attributes);
    }

    #[test]
    fn test_merge_with_nothing_set_is_identity() {
        let update = CategoryDescription::new("compute", "http://x/#");
        let merged = merge_category_description(&stored(), &update).unwrap();
        assert_eq!(merged, stored());
    }

    #[test]
    fn test_merge_rejects_unknown_fields() {
        let update = CategoryDescription::new("compute", "http://x/#")
            .with_title("VM")
            .with_location("/vms/")
            .with_related(vec!["http://x/#resource".to_owned()]);
        let err = merge_category_description(&stored(), &update).unwrap_err();
        assert_eq!(err, MergeError::UnknownFields(vec!["related", "location"]));
    }

    #[test]
    fn test_merge_action_description() {
        let stored = ActionDescription::new("start", "http://x/action#").with_title("Start");
        let update = ActionDescription::new("start", "http://x/action#").with_title("Boot");
        let merged = merge_action_description(&stored, &update).unwrap();
        assert_eq!(merged.title.as_deref(), Some("Boot"));

        let update = ActionDescription {
            attributes: Some(json!({"method": "hard"})),
            ..ActionDescription::new("start", "http://x/action#")
        };
        assert!(merge_action_description(&stored, &update).is_err());
    }

    #[test]
    fn test_merge_provider_unions_sets() {
        let mut stored = Provider::default();
        stored.local.insert("node-a".to_owned());

        let update = ProviderUpdate {
            local: Some(vec!["node-b".to_owned(), "node-a".to_owned()]),
            remote: Some(vec!["site-1".to_owned()]),
        };
        let merged = merge_provider(&stored, &update).unwrap();
        assert_eq!(
            merged.local.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["node-a", "node-b"]
        );
        assert_eq!(merged.remote.len(), 1);
    }

    #[test]
    fn test_merge_provider_rejects_incomplete_updates() {
        let stored = Provider::default();
        assert_eq!(
            merge_provider(&stored, &ProviderUpdate::default()),
            Err(MergeError::EmptyProviderUpdate)
        );

        let update = ProviderUpdate {
            local: None,
            remote: Some(vec![" ".to_owned()]),
        };
        assert_eq!(
            merge_provider(&stored, &update),
            Err(MergeError::EmptyIdentifier)
        );
    }
}
