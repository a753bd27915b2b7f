//! Typed views of the Admin API resources.
//!
//! Fields the server may send as `null` are `Option`s; everything else
//! falls back to its default when absent.

use serde::{Deserialize, Serialize};

use crate::resources::ApiResource;

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    pub featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
}

/// A static page. Same write model as [`Post`], fewer fields shown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Page {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub status: String,
    pub featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_image: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// ---------------------------------------------------------------------------
// Audience
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub status: String,
    pub subscribed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub newsletters: Vec<Newsletter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Label {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tier {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub active: bool,
    /// `free` or `paid`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_page_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub visibility: String,
    /// Minor currency units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yearly_price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_days: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Newsletter {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_reply_to: Option<String>,
    pub status: String,
    pub visibility: String,
    pub subscribe_on_signup: bool,
    pub sort_order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Staff and site
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Site metadata from `/site/`. Not a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Site {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub url: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// ApiResource impls
// ---------------------------------------------------------------------------

impl ApiResource for Post {
    const COLLECTION: &'static str = "posts";
    const SINGULAR: &'static str = "post";

    fn id(&self) -> &str {
        &self.id
    }
}

impl ApiResource for Page {
    const COLLECTION: &'static str = "pages";
    const SINGULAR: &'static str = "page";

    fn id(&self) -> &str {
        &self.id
    }
}

impl ApiResource for Tag {
    const COLLECTION: &'static str = "tags";
    const SINGULAR: &'static str = "tag";

    fn id(&self) -> &str {
        &self.id
    }
}

impl ApiResource for Member {
    const COLLECTION: &'static str = "members";
    const SINGULAR: &'static str = "member";
    const LOOKUP_FIELD: &'static str = "email";

    fn id(&self) -> &str {
        &self.id
    }
}

impl ApiResource for Tier {
    const COLLECTION: &'static str = "tiers";
    const SINGULAR: &'static str = "tier";

    fn id(&self) -> &str {
        &self.id
    }
}

impl ApiResource for Newsletter {
    const COLLECTION: &'static str = "newsletters";
    const SINGULAR: &'static str = "newsletter";

    fn id(&self) -> &str {
        &self.id
    }
}

impl ApiResource for User {
    const COLLECTION: &'static str = "users";
    const SINGULAR: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_tolerates_nulls_and_missing_fields() {
        let json = r#"{
            "id": "64f0",
            "title": "Hello",
            "slug": "hello",
            "status": "draft",
            "published_at": null,
            "feature_image": null,
            "tags": [{"id": "t1", "name": "Rust", "slug": "rust", "description": null}]
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.title, "Hello");
        assert!(post.published_at.is_none());
        assert!(!post.featured);
        assert_eq!(post.tags[0].name, "Rust");
    }

    #[test]
    fn tier_type_maps_to_kind() {
        let tier: Tier = serde_json::from_str(
            r#"{"id":"1","name":"Free","slug":"free","type":"free","active":true,"visibility":"public","monthly_price":null}"#,
        )
        .unwrap();
        assert_eq!(tier.kind, "free");
        assert!(tier.monthly_price.is_none());

        let back = serde_json::to_value(&tier).unwrap();
        assert_eq!(back["type"], "free");
    }

    #[test]
    fn lookup_fields() {
        assert_eq!(Member::LOOKUP_FIELD, "email");
        assert_eq!(Post::LOOKUP_FIELD, "slug");
        assert_eq!(Newsletter::COLLECTION, "newsletters");
    }
}
