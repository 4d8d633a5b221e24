use std::{fmt, ops::Deref, sync::LazyLock};

use non_empty_string::NonEmptyString;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// The display name of a position.
///
/// Names are non-empty once trimmed. They are the natural key for relation
/// lookups, compared through [`PositionName::normalized`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PositionName(NonEmptyString);

impl PositionName {
    /// Creates a new name, trimming surrounding whitespace.
    ///
    /// Returns `None` if nothing is left after trimming.
    #[must_use]
    pub fn new(name: &str) -> Option<Self> {
        NonEmptyString::new(name.trim().to_string()).ok().map(Self)
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The lookup key for this name.
    #[must_use]
    pub fn normalized(&self) -> String {
        normalize(self.as_str())
    }
}

impl Deref for PositionName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for PositionName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalizes a free-text name or reference for case-insensitive lookup.
///
/// Surrounding whitespace is dropped, internal whitespace runs collapse to a
/// single space and the result is lowercased.
#[must_use]
pub fn normalize(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").to_lowercase()
}

/// One organizational role, as submitted by the caller.
///
/// Every field except `name` is optional. Missing lists default to empty and
/// a missing `order` defaults to the index in the submitted list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionInput {
    /// Stable identifier. Generated at load time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Number of employees, as free text or integer.
    #[serde(
        default,
        deserialize_with = "deserialize_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub employee_count: Option<String>,

    /// Required education.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education_requirements: Option<String>,

    /// Required work experience.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_requirements: Option<String>,

    /// Ordered list of responsibilities.
    #[serde(default)]
    pub responsibilities: Vec<String>,

    /// References (by name or id) to superior positions.
    #[serde(default)]
    pub reports_to: Vec<String>,

    /// References (by name or id) to subordinate positions.
    #[serde(default)]
    pub subordinates: Vec<String>,

    /// Sibling order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,
}

impl PositionInput {
    /// Shorthand for an input carrying only a name.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Adds a superior reference.
    #[must_use]
    pub fn reporting_to(mut self, superior: &str) -> Self {
        self.reports_to.push(superior.to_string());
        self
    }
}

/// Employee counts arrive either as numbers or as text.
fn deserialize_count<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    Ok(Option::<Count>::deserialize(deserializer)?.map(|count| match count {
        Count::Number(n) => n.to_string(),
        Count::Text(text) => text,
    }))
}

/// A normalized position held by a [`Snapshot`](super::Snapshot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub(crate) id: String,
    pub(crate) name: PositionName,
    pub(crate) employee_count: Option<String>,
    pub(crate) education_requirements: Option<String>,
    pub(crate) experience_requirements: Option<String>,
    pub(crate) responsibilities: Vec<String>,
    pub(crate) reports_to: Vec<String>,
    pub(crate) subordinates: Vec<String>,
    pub(crate) level: usize,
    pub(crate) order: usize,
}

impl Position {
    /// Stable identifier, unique within the snapshot.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub const fn name(&self) -> &PositionName {
        &self.name
    }

    /// Number of employees, if given.
    #[must_use]
    pub fn employee_count(&self) -> Option<&str> {
        self.employee_count.as_deref()
    }

    /// Required education, if given.
    #[must_use]
    pub fn education_requirements(&self) -> Option<&str> {
        self.education_requirements.as_deref()
    }

    /// Required work experience, if given.
    #[must_use]
    pub fn experience_requirements(&self) -> Option<&str> {
        self.experience_requirements.as_deref()
    }

    /// Responsibilities, in submitted order. Blank entries are kept.
    #[must_use]
    pub fn responsibilities(&self) -> &[String] {
        &self.responsibilities
    }

    /// References to superior positions.
    #[must_use]
    pub fn reports_to(&self) -> &[String] {
        &self.reports_to
    }

    /// References to subordinate positions.
    #[must_use]
    pub fn subordinates(&self) -> &[String] {
        &self.subordinates
    }

    /// Depth in the hierarchy; 0 for roots.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    /// Position within the sibling order.
    #[must_use]
    pub const fn order(&self) -> usize {
        self.order
    }

    /// Whether `reference` names this position, by id or by normalized name.
    #[must_use]
    pub fn is_named_by(&self, reference: &str) -> bool {
        reference.trim() == self.id || normalize(reference) == self.name.normalized()
    }
}

impl From<&Position> for PositionInput {
    fn from(position: &Position) -> Self {
        Self {
            id: Some(position.id.clone()),
            name: Some(position.name.to_string()),
            employee_count: position.employee_count.clone(),
            education_requirements: position.education_requirements.clone(),
            experience_requirements: position.experience_requirements.clone(),
            responsibilities: position.responsibilities.clone(),
            reports_to: position.reports_to.clone(),
            subordinates: position.subordinates.clone(),
            order: Some(position.order),
        }
    }
}
