//! Write payloads for create and update calls.
//!
//! Every field is optional and unset fields are never serialized, so the same
//! struct serves both full creates and partial updates.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use ghostwriter_shared::{GhostwriterError, Result};

// ---------------------------------------------------------------------------
// Enumerated values
// ---------------------------------------------------------------------------

/// Publication state of a post or page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Scheduled,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Scheduled => "scheduled",
        }
    }
}

impl FromStr for PostStatus {
    type Err = GhostwriterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "scheduled" => Ok(Self::Scheduled),
            other => Err(invalid_choice("status", other, "draft, published, scheduled")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagVisibility {
    Public,
    Internal,
}

impl TagVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagVisibility::Public => "public",
            TagVisibility::Internal => "internal",
        }
    }
}

impl FromStr for TagVisibility {
    type Err = GhostwriterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "internal" => Ok(Self::Internal),
            other => Err(invalid_choice("visibility", other, "public, internal")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierVisibility {
    Public,
    None,
}

impl TierVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierVisibility::Public => "public",
            TierVisibility::None => "none",
        }
    }
}

impl FromStr for TierVisibility {
    type Err = GhostwriterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "none" => Ok(Self::None),
            other => Err(invalid_choice("visibility", other, "public, none")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsletterStatus {
    Active,
    Archived,
}

impl NewsletterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsletterStatus::Active => "active",
            NewsletterStatus::Archived => "archived",
        }
    }
}

impl FromStr for NewsletterStatus {
    type Err = GhostwriterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            other => Err(invalid_choice("status", other, "active, archived")),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(PostStatus, TagVisibility, TierVisibility, NewsletterStatus);

fn invalid_choice(what: &str, got: &str, expected: &str) -> GhostwriterError {
    GhostwriterError::validation(format!("invalid {what} '{got}': expected one of {expected}"))
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Reference to a related record by name (tags on posts, labels on members).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameRef {
    pub name: String,
}

/// Turn a list of names into `[{"name": ...}]`, dropping blanks.
pub fn name_refs<I, S>(names: I) -> Vec<NameRef>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .filter(|n| !n.is_empty())
        .map(|name| NameRef { name })
        .collect()
}

/// Post or page write model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<NameRef>>,
    /// Required by the server on updates for collision detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl PostPayload {
    /// True when no content or metadata field is set. `updated_at` is ignored.
    pub fn is_empty(&self) -> bool {
        Self {
            updated_at: None,
            ..self.clone()
        } == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TagPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<TagVisibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemberPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<NameRef>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yearly_price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<TierVisibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_page_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewsletterPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_reply_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<NewsletterStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribe_on_signup: Option<bool>,
}

/// Reject an update that would send nothing.
pub fn ensure_has_updates<P: Default + PartialEq>(payload: &P) -> Result<()> {
    if *payload == P::default() {
        return Err(GhostwriterError::validation("no updates specified"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Wraps one payload as `{"<collection>": [payload]}`.
#[derive(Debug)]
pub struct Envelope<'a, P> {
    collection: &'a str,
    item: &'a P,
}

impl<'a, P> Envelope<'a, P> {
    pub fn new(collection: &'a str, item: &'a P) -> Self {
        Self { collection, item }
    }
}

impl<P: Serialize> Serialize for Envelope<'_, P> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.collection, std::slice::from_ref(self.item))?;
        map.end()
    }
}
