//! Generic resource operations on top of the request pipeline.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use ghostwriter_shared::{GhostwriterError, Result};

use crate::models::Site;
use crate::pagination::{Page, fetch_all, list_page};
use crate::payload::Envelope;
use crate::pipeline::{AdminClient, Query};

/// A collection exposed by the Admin API.
pub trait ApiResource: DeserializeOwned {
    /// Collection name, used both in paths and as the envelope key.
    const COLLECTION: &'static str;

    /// Human-readable name used in messages.
    const SINGULAR: &'static str;

    /// Field matched by the fallback filter lookup.
    const LOOKUP_FIELD: &'static str = "slug";

    fn id(&self) -> &str;

    fn collection_path() -> String {
        format!("/{}/", Self::COLLECTION)
    }

    fn item_path(id: &str) -> String {
        format!("/{}/{id}/", Self::COLLECTION)
    }
}

/// Query that makes the server convert an `html` field into its own format.
pub fn html_source() -> Query {
    Query::new().with("source", "html")
}

/// Decode the first item of a collection envelope.
pub fn first_item<R: ApiResource>(body: &[u8]) -> Result<R> {
    Page::<R>::from_envelope(body, R::COLLECTION)?
        .items
        .into_iter()
        .next()
        .ok_or_else(|| GhostwriterError::response_shape(format!("no {} in response", R::SINGULAR)))
}

/// Look a record up by id, then by its lookup field.
///
/// Any failure of the direct request except cancellation falls through to the
/// filtered collection query; an empty result there is [`GhostwriterError::NotFound`].
#[instrument(skip(client), fields(collection = R::COLLECTION))]
pub async fn find<R: ApiResource>(client: &AdminClient<'_>, ident: &str) -> Result<R> {
    let direct = client
        .get(&R::item_path(ident), &Query::new())
        .await
        .and_then(|body| first_item::<R>(&body));

    match direct {
        Ok(item) => return Ok(item),
        Err(GhostwriterError::Cancelled) => return Err(GhostwriterError::Cancelled),
        Err(err) => debug!(error = %err, "direct lookup failed, trying filter"),
    }

    let query = Query::new().with("filter", format!("{}:{ident}", R::LOOKUP_FIELD));
    let body = client.get(&R::collection_path(), &query).await?;

    Page::<R>::from_envelope(&body, R::COLLECTION)?
        .items
        .into_iter()
        .next()
        .ok_or_else(|| GhostwriterError::not_found(R::SINGULAR, ident))
}

/// Fetch a single page of the collection.
pub async fn list<R: ApiResource>(
    client: &AdminClient<'_>,
    limit: u32,
    page: u64,
    extra: &Query,
) -> Result<Page<R>> {
    list_page(client, &R::collection_path(), R::COLLECTION, limit, page, extra).await
}

/// Fetch every record of the collection.
pub async fn list_all<R: ApiResource>(
    client: &AdminClient<'_>,
    page_size: u32,
    extra: &Query,
) -> Result<Vec<R>> {
    fetch_all(client, &R::collection_path(), R::COLLECTION, page_size, extra).await
}

pub async fn create<R: ApiResource, P: Serialize>(
    client: &AdminClient<'_>,
    payload: &P,
    query: &Query,
) -> Result<R> {
    let body = client
        .post(&R::collection_path(), query, &Envelope::new(R::COLLECTION, payload))
        .await?;
    first_item(&body)
}

pub async fn update<R: ApiResource, P: Serialize>(
    client: &AdminClient<'_>,
    id: &str,
    payload: &P,
    query: &Query,
) -> Result<R> {
    let body = client
        .put(&R::item_path(id), query, &Envelope::new(R::COLLECTION, payload))
        .await?;
    first_item(&body)
}

pub async fn delete<R: ApiResource>(client: &AdminClient<'_>, id: &str) -> Result<()> {
    client.delete(&R::item_path(id)).await?;
    Ok(())
}

/// Fetch `/site/` metadata.
pub async fn site_info(client: &AdminClient<'_>) -> Result<Site> {
    let body = client.get("/site/", &Query::new()).await?;
    let mut envelope: Value = serde_json::from_slice(&body)
        .map_err(|e| GhostwriterError::response_shape(format!("decoding site: {e}")))?;

    match envelope.get_mut("site").map(Value::take) {
        Some(site @ Value::Object(_)) => serde_json::from_value(site)
            .map_err(|e| GhostwriterError::response_shape(format!("decoding site: {e}"))),
        _ => Err(GhostwriterError::response_shape("no site in response")),
    }
}
