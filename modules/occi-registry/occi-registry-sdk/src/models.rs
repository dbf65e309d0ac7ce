//! Public models for the `occi-registry` module.
//!
//! These are transport-agnostic data structures that define the contract
//! between the `occi-registry` module and its consumers: category and entity
//! descriptions, the persisted document shapes, composite request shapes and
//! the closed status vocabulary.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Category types
// =============================================================================

/// The three category types of the resource-description model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryType {
    /// Describes a type of resource.
    Kind,
    /// Attachable capability set, independent of the kind.
    Mixin,
    /// Named operation invocable on entities.
    Action,
}

impl CategoryType {
    /// Returns the canonical name used as a view key in the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kind => "Kind",
            Self::Mixin => "Mixin",
            Self::Action => "Action",
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two entity types of the resource-description model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Resource,
    Link,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource => f.write_str("Resource"),
            Self::Link => f.write_str("Link"),
        }
    }
}

// =============================================================================
// Category descriptions
// =============================================================================

/// Read access to the fields a filter can match on.
pub trait CategoryFields {
    fn term(&self) -> &str;
    fn scheme(&self) -> &str;
    fn title(&self) -> Option<&str>;

    /// Declared location. Actions never have one.
    fn location(&self) -> Option<&str> {
        None
    }

    /// Related category identifiers. Actions never relate.
    fn related(&self) -> &[String] {
        &[]
    }
}

/// Structured description of a Kind or a Mixin.
///
/// `term` and `scheme` identify the category; every other field is optional
/// and absent fields are omitted on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryDescription {
    pub term: String,
    pub scheme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Identifiers of related (parent) categories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<Vec<String>>,
    /// Attribute specifications, opaque to the registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<serde_json::Value>,
    /// Identifiers of the actions applicable to this category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl CategoryDescription {
    /// Creates a description with only the identifying fields set.
    #[must_use]
    pub fn new(term: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            scheme: scheme.into(),
            title: None,
            related: None,
            attributes: None,
            actions: None,
            location: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_related(mut self, related: Vec<String>) -> Self {
        self.related = Some(related);
        self
    }

    #[must_use]
    pub fn with_actions(mut self, actions: Vec<String>) -> Self {
        self.actions = Some(actions);
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: serde_json::Value) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Declared action identifiers, empty when none are declared.
    #[must_use]
    pub fn declared_actions(&self) -> &[String] {
        self.actions.as_deref().unwrap_or_default()
    }
}

impl CategoryFields for CategoryDescription {
    fn term(&self) -> &str {
        &self.term
    }

    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn related(&self) -> &[String] {
        self.related.as_deref().unwrap_or_default()
    }
}

/// Structured description of an Action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionDescription {
    pub term: String,
    pub scheme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<serde_json::Value>,
}

impl ActionDescription {
    #[must_use]
    pub fn new(term: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            scheme: scheme.into(),
            title: None,
            attributes: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl CategoryFields for ActionDescription {
    fn term(&self) -> &str {
        &self.term
    }

    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

/// A category description tagged with its category type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "description")]
pub enum Description {
    Kind(CategoryDescription),
    Mixin(CategoryDescription),
    Action(ActionDescription),
}

// =============================================================================
// Providers and filters
// =============================================================================

/// Per-Kind bookkeeping of the subsystems implementing that Kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub local: BTreeSet<String>,
    pub remote: BTreeSet<String>,
}

/// Partial provider update. Present sets are merged into the stored ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<Vec<String>>,
}

/// Field-match predicate over a category description.
///
/// Every field that is set must match; unset fields match anything.
/// `related` matches when the description relates to the given identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
}

impl CategoryFilter {
    /// Matches on `term` only.
    #[must_use]
    pub fn by_term(term: impl Into<String>) -> Self {
        Self {
            term: Some(term.into()),
            ..Self::default()
        }
    }

    /// Matches on `scheme` only.
    #[must_use]
    pub fn by_scheme(scheme: impl Into<String>) -> Self {
        Self {
            scheme: Some(scheme.into()),
            ..Self::default()
        }
    }

    /// Returns `true` if the description satisfies every field set on this filter.
    #[must_use]
    pub fn matches<D: CategoryFields + ?Sized>(&self, description: &D) -> bool {
        if let Some(ref term) = self.term
            && term != description.term()
        {
            return false;
        }
        if let Some(ref scheme) = self.scheme
            && scheme != description.scheme()
        {
            return false;
        }
        if let Some(ref title) = self.title
            && description.title() != Some(title.as_str())
        {
            return false;
        }
        if let Some(ref location) = self.location
            && description.location() != Some(location.as_str())
        {
            return false;
        }
        if let Some(ref related) = self.related
            && !description.related().iter().any(|r| r == related)
        {
            return false;
        }
        true
    }
}

// =============================================================================
// Category documents
// =============================================================================

/// Type-specific part of a category document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CategoryBody {
    Kind {
        description: CategoryDescription,
        location: String,
        provider: Provider,
    },
    Mixin {
        description: CategoryDescription,
        location: String,
    },
    Action {
        description: ActionDescription,
    },
}

/// Persisted unit for a Kind, Mixin, or Action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDocument {
    /// Opaque store key, assigned at creation.
    pub id: Uuid,
    /// `scheme` + `term`, unique across all category documents.
    pub occi_id: String,
    pub creator: String,
    pub creation_date: DateTime<Utc>,
    /// `None` until the first update.
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub body: CategoryBody,
}

impl CategoryDocument {
    #[must_use]
    pub const fn category_type(&self) -> CategoryType {
        match self.body {
            CategoryBody::Kind { .. } => CategoryType::Kind,
            CategoryBody::Mixin { .. } => CategoryType::Mixin,
            CategoryBody::Action { .. } => CategoryType::Action,
        }
    }

    /// Location of a Kind or Mixin; `None` for an Action.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match &self.body {
            CategoryBody::Kind { location, .. } | CategoryBody::Mixin { location, .. } => {
                Some(location)
            }
            CategoryBody::Action { .. } => None,
        }
    }

    /// Provider of a Kind; `None` for the other types.
    #[must_use]
    pub fn provider(&self) -> Option<&Provider> {
        match &self.body {
            CategoryBody::Kind { provider, .. } => Some(provider),
            _ => None,
        }
    }

    /// Returns a tagged copy of the stored description.
    #[must_use]
    pub fn description(&self) -> Description {
        match &self.body {
            CategoryBody::Kind { description, .. } => Description::Kind(description.clone()),
            CategoryBody::Mixin { description, .. } => Description::Mixin(description.clone()),
            CategoryBody::Action { description } => Description::Action(description.clone()),
        }
    }

    /// Returns `true` if `user_id` created this document.
    #[must_use]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.creator == user_id
    }
}

// =============================================================================
// Entities
// =============================================================================

/// A link declared on a resource: either the location of an existing link
/// or an inline description of a link to create alongside the resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkReference {
    Location(String),
    Inline(LinkDescription),
}

/// Description of a Resource entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceDescription {
    /// Local identifier, unique under the kind location of its creator.
    pub id: String,
    /// Identifier of the Kind this resource is an instance of.
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixins: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<LinkReference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<serde_json::Value>,
}

impl ResourceDescription {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            title: None,
            summary: None,
            mixins: None,
            actions: None,
            links: None,
            attributes: None,
        }
    }

    #[must_use]
    pub fn with_mixins(mut self, mixins: Vec<String>) -> Self {
        self.mixins = Some(mixins);
        self
    }

    #[must_use]
    pub fn with_actions(mut self, actions: Vec<String>) -> Self {
        self.actions = Some(actions);
        self
    }

    #[must_use]
    pub fn with_links(mut self, links: Vec<LinkReference>) -> Self {
        self.links = Some(links);
        self
    }
}

/// Description of a Link entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkDescription {
    pub id: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixins: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
    /// Location of the source resource. Stamped by the registry for implicit links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Location of the target resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<serde_json::Value>,
}

impl LinkDescription {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            title: None,
            mixins: None,
            actions: None,
            source: None,
            target: None,
            attributes: None,
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Type-specific part of an entity document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EntityBody {
    Resource { description: ResourceDescription },
    Link { description: LinkDescription },
}

/// Persisted unit for a Resource or Link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDocument {
    pub id: Uuid,
    pub creator: String,
    pub creation_date: DateTime<Utc>,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    /// Derived from creator + kind location + local identifier.
    pub location: String,
    #[serde(flatten)]
    pub body: EntityBody,
}

impl EntityDocument {
    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        match self.body {
            EntityBody::Resource { .. } => EntityType::Resource,
            EntityBody::Link { .. } => EntityType::Link,
        }
    }

    /// Identifier of the Kind this entity belongs to.
    #[must_use]
    pub fn kind(&self) -> &str {
        match &self.body {
            EntityBody::Resource { description } => &description.kind,
            EntityBody::Link { description } => &description.kind,
        }
    }

    /// Mixin identifiers attached to this entity.
    #[must_use]
    pub fn mixins(&self) -> &[String] {
        let mixins = match &self.body {
            EntityBody::Resource { description } => description.mixins.as_deref(),
            EntityBody::Link { description } => description.mixins.as_deref(),
        };
        mixins.unwrap_or_default()
    }

    /// Strips `mixin_id` from the entity's mixins. Returns `true` if it was attached.
    pub fn dissociate_mixin(&mut self, mixin_id: &str) -> bool {
        let mixins = match &mut self.body {
            EntityBody::Resource { description } => description.mixins.as_mut(),
            EntityBody::Link { description } => description.mixins.as_mut(),
        };
        let Some(mixins) = mixins else {
            return false;
        };
        let before = mixins.len();
        mixins.retain(|m| m != mixin_id);
        mixins.len() != before
    }
}

/// Outcome of admitting one resource description.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceOutcome {
    /// The resource was persisted at `location`, together with `links`
    /// created implicitly from its inline link descriptions.
    Created {
        location: String,
        links: Vec<String>,
    },
    /// The resource was rejected; nothing was persisted for it.
    Rejected {
        id: String,
        status: StatusCode,
        message: String,
    },
}

impl ResourceOutcome {
    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }

    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Location of the created resource, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Created { location, .. } => Some(location),
            Self::Rejected { .. } => None,
        }
    }
}

// =============================================================================
// Composite requests and results
// =============================================================================

/// Composite create request. Absent keys are empty sub-requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<CategoryDescription>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixins: Option<Vec<CategoryDescription>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionDescription>>,
}

/// Composite filter request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<CategoryFilter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixins: Option<Vec<CategoryFilter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<CategoryFilter>>,
}

/// Provider update addressed to one Kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderUpdateEntry {
    #[serde(rename = "occiId")]
    pub occi_id: String,
    pub provider: ProviderUpdate,
}

/// Composite update request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<CategoryDescription>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixins: Option<Vec<CategoryDescription>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionDescription>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers: Option<Vec<ProviderUpdateEntry>>,
}

/// Composite delete request. Only `term` and `scheme` of each description are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<CategoryDescription>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixins: Option<Vec<CategoryDescription>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionDescription>>,
}

/// Result of a listing or filter query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryListing {
    pub kinds: Vec<CategoryDescription>,
    pub mixins: Vec<CategoryDescription>,
    pub actions: Vec<ActionDescription>,
}

// =============================================================================
// Status vocabulary
// =============================================================================

/// Complete outcome vocabulary of every registry operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    Ok,
    BadRequest,
    Forbidden,
    NotFound,
    Conflict,
    InternalError,
}

impl StatusCode {
    /// Numeric HTTP-style code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::InternalError => 500,
        }
    }

    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Ok => "OK",
            Self::BadRequest => "Bad Request",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::Conflict => "Conflict",
            Self::InternalError => "Internal Server Error",
        };
        write!(f, "{} {reason}", self.as_u16())
    }
}

/// Body of a [`RegistryResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseBody<T> {
    Result(T),
    ErrorMessage(String),
}

/// Transport-agnostic response: a status plus either a result or a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryResponse<T> {
    pub status: StatusCode,
    pub body: ResponseBody<T>,
}

impl<T> RegistryResponse<T> {
    #[must_use]
    pub const fn ok(result: T) -> Self {
        Self {
            status: StatusCode::Ok,
            body: ResponseBody::Result(result),
        }
    }

    #[must_use]
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ResponseBody::ErrorMessage(message.into()),
        }
    }
}

impl<T> From<Result<T, crate::error::OcciRegistryError>> for RegistryResponse<T> {
    fn from(result: Result<T, crate::error::OcciRegistryError>) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(e) => Self::error(e.status(), e.message()),
        }
    }
}
