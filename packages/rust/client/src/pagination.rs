//! Page-number pagination over Admin API collections.
//!
//! Collection responses look like
//! `{"<collection>": [...], "meta": {"pagination": {"next": 2}}}` where a
//! missing or null `next` ends the walk.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, instrument};

use ghostwriter_shared::{GhostwriterError, Result};

use crate::pipeline::{AdminClient, Query};

/// One decoded page of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor of the following page; `0` when this is the last one.
    pub next_cursor: u64,
}

impl<T: DeserializeOwned> Page<T> {
    /// Decode a collection envelope into items plus the next cursor.
    ///
    /// A missing collection key yields an empty page.
    pub fn from_envelope(bytes: &[u8], collection: &str) -> Result<Self> {
        let mut envelope: Value = serde_json::from_slice(bytes)
            .map_err(|e| GhostwriterError::response_shape(format!("decoding {collection}: {e}")))?;

        let items = match envelope.get_mut(collection).map(Value::take) {
            None | Some(Value::Null) => Vec::new(),
            Some(raw) => serde_json::from_value(raw).map_err(|e| {
                GhostwriterError::response_shape(format!("decoding {collection}: {e}"))
            })?,
        };

        let next_cursor = envelope
            .pointer("/meta/pagination/next")
            .and_then(Value::as_u64)
            .unwrap_or(0);

        Ok(Self { items, next_cursor })
    }
}

/// Fetch page `page` of `path`, sending `limit` and `page` after the `extra` parameters.
pub async fn list_page<T: DeserializeOwned>(
    client: &AdminClient<'_>,
    path: &str,
    collection: &str,
    limit: u32,
    page: u64,
    extra: &Query,
) -> Result<Page<T>> {
    let mut query = extra.clone();
    query.push("limit", limit);
    query.push("page", page);

    let body = client.get(path, &query).await?;
    Page::from_envelope(&body, collection)
}

/// Walk every page of `path`, starting at cursor 1, and concatenate the items.
///
/// Each page is requested with `limit=<page_size>&page=<cursor>` after the
/// `extra` parameters. The walk stops when the server reports no next page.
/// Any error aborts the walk and discards the items gathered so far. A cursor
/// that was already fetched fails with [`GhostwriterError::PaginationLoop`].
#[instrument(skip(client, extra))]
pub async fn fetch_all<T: DeserializeOwned>(
    client: &AdminClient<'_>,
    path: &str,
    collection: &str,
    page_size: u32,
    extra: &Query,
) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut visited = HashSet::new();
    let mut cursor: u64 = 1;

    loop {
        client.check_cancelled()?;

        if !visited.insert(cursor) {
            return Err(GhostwriterError::PaginationLoop { cursor });
        }

        let page: Page<T> = list_page(client, path, collection, page_size, cursor, extra).await?;
        items.extend(page.items);
        info!(cursor, total = items.len(), next = page.next_cursor, "page fetched");

        if page.next_cursor == 0 {
            break;
        }
        cursor = page.next_cursor;
    }

    Ok(items)
}
