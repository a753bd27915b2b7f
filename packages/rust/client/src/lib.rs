//! Ghost Admin API client.
//!
//! This crate provides:
//! - [`signing`]: hex codec and HMAC-SHA256
//! - [`token`]: short-lived admin tokens issued from an `id:secret` key
//! - [`AdminClient`]: the authenticated request pipeline
//! - [`pagination`]: page walking over collection endpoints
//! - [`UploadBody`]: image files read for multipart upload
//! - [`resources`]: typed lookups, listings and writes for each collection

pub mod models;
pub mod pagination;
pub mod payload;
pub mod pipeline;
pub mod resources;
pub mod signing;
pub mod token;
pub mod upload;

pub use pagination::{Page, fetch_all, list_page};
pub use payload::{
    Envelope, MemberPayload, NameRef, NewsletterPayload, NewsletterStatus, PostPayload, PostStatus,
    TagPayload, TagVisibility, TierPayload, TierVisibility, ensure_has_updates, name_refs,
};
pub use pipeline::{ACCEPT_VERSION, AUTH_SCHEME, AdminClient, ClientOptions, HttpMethod, Query};
pub use resources::{
    ApiResource, create, delete, find, first_item, html_source, list, list_all, site_info, update,
};
pub use token::{AdminKey, AdminToken, issue_token};
pub use upload::UploadBody;
