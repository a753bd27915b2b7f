//! `posts` and `pages`: content written from Markdown files.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use color_eyre::eyre::Result;
use ghostwriter_client::models::{Page, Post, Tag};
use ghostwriter_client::{
    AdminClient, ApiResource, PostPayload, PostStatus, create, delete, find, html_source,
    name_refs, update,
};
use ghostwriter_markdown::{ParsedContent, PostFrontmatter, parse_file};
use ghostwriter_shared::GhostwriterError;
use serde::Serialize;
use tracing::info;

use super::{Ctx, ListArgs, fetch_listing, print_deleted};
use crate::output::{self, Table};

#[derive(Subcommand)]
pub(crate) enum PostAction {
    /// List posts.
    List(ListArgs),

    /// Get a post by ID or slug.
    Get { id_or_slug: String },

    /// Create a post from a Markdown file with frontmatter ('-' reads stdin).
    Create {
        file: PathBuf,

        /// Post status: draft, published or scheduled.
        #[arg(long)]
        status: Option<PostStatus>,

        /// Scheduled publish time (ISO 8601).
        #[arg(long)]
        publish_at: Option<String>,
    },

    /// Update a post from a file, flags, or both.
    Update {
        id_or_slug: String,
        file: Option<PathBuf>,

        #[arg(long)]
        status: Option<PostStatus>,

        /// Scheduled publish time (ISO 8601).
        #[arg(long)]
        publish_at: Option<String>,
    },

    /// Delete a post.
    Delete { id_or_slug: String },
}

#[derive(Subcommand)]
pub(crate) enum PageAction {
    /// List pages.
    List(ListArgs),

    /// Get a page by ID or slug.
    Get { id_or_slug: String },

    /// Create a page from a Markdown file with frontmatter ('-' reads stdin).
    Create {
        file: PathBuf,

        /// Page status: draft or published.
        #[arg(long)]
        status: Option<PostStatus>,
    },

    /// Update a page from a file, flags, or both.
    Update {
        id_or_slug: String,
        file: Option<PathBuf>,

        #[arg(long)]
        status: Option<PostStatus>,
    },

    /// Delete a page.
    Delete { id_or_slug: String },
}

pub(crate) async fn run_posts(ctx: &Ctx<'_>, action: PostAction) -> Result<()> {
    match action {
        PostAction::List(args) => cmd_list::<Post>(ctx, &args).await,
        PostAction::Get { id_or_slug } => cmd_get::<Post>(ctx, &id_or_slug).await,
        PostAction::Create {
            file,
            status,
            publish_at,
        } => cmd_create::<Post>(ctx, &file, status, publish_at).await,
        PostAction::Update {
            id_or_slug,
            file,
            status,
            publish_at,
        } => cmd_update::<Post>(ctx, &id_or_slug, file.as_deref(), status, publish_at).await,
        PostAction::Delete { id_or_slug } => cmd_delete::<Post>(ctx, &id_or_slug).await,
    }
}

pub(crate) async fn run_pages(ctx: &Ctx<'_>, action: PageAction) -> Result<()> {
    match action {
        PageAction::List(args) => cmd_list::<Page>(ctx, &args).await,
        PageAction::Get { id_or_slug } => cmd_get::<Page>(ctx, &id_or_slug).await,
        PageAction::Create { file, status } => cmd_create::<Page>(ctx, &file, status, None).await,
        PageAction::Update {
            id_or_slug,
            file,
            status,
        } => cmd_update::<Page>(ctx, &id_or_slug, file.as_deref(), status, None).await,
        PageAction::Delete { id_or_slug } => cmd_delete::<Page>(ctx, &id_or_slug).await,
    }
}

// ---------------------------------------------------------------------------
// Content records
// ---------------------------------------------------------------------------

/// Read access shared by posts and pages.
trait ContentRecord: ApiResource + Serialize {
    fn title(&self) -> &str;
    fn slug(&self) -> &str;
    fn status(&self) -> &str;
    fn url(&self) -> Option<&str>;
    fn published_at(&self) -> Option<&str>;
    fn updated_at(&self) -> Option<&str>;
    fn tags(&self) -> &[Tag];
    fn excerpt(&self) -> Option<&str> {
        None
    }
}

impl ContentRecord for Post {
    fn title(&self) -> &str {
        &self.title
    }
    fn slug(&self) -> &str {
        &self.slug
    }
    fn status(&self) -> &str {
        &self.status
    }
    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
    fn published_at(&self) -> Option<&str> {
        self.published_at.as_deref()
    }
    fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }
    fn tags(&self) -> &[Tag] {
        &self.tags
    }
    fn excerpt(&self) -> Option<&str> {
        self.excerpt.as_deref()
    }
}

impl ContentRecord for Page {
    fn title(&self) -> &str {
        &self.title
    }
    fn slug(&self) -> &str {
        &self.slug
    }
    fn status(&self) -> &str {
        &self.status
    }
    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
    fn published_at(&self) -> Option<&str> {
        self.published_at.as_deref()
    }
    fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }
    fn tags(&self) -> &[Tag] {
        &self.tags
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn cmd_list<R: ContentRecord>(ctx: &Ctx<'_>, args: &ListArgs) -> Result<()> {
    let items: Vec<R> = fetch_listing(ctx, args).await?;

    if ctx.json() {
        return output::print_json(&items);
    }

    let mut table = Table::new(&["ID", "TITLE", "STATUS", "PUBLISHED"]);
    for item in &items {
        table.row([
            item.id().to_string(),
            output::truncate(item.title(), 50),
            item.status().to_string(),
            output::date_only(item.published_at()),
        ]);
    }
    table.print();
    Ok(())
}

async fn cmd_get<R: ContentRecord>(ctx: &Ctx<'_>, ident: &str) -> Result<()> {
    let item: R = find(&ctx.client, ident).await?;

    if ctx.json() {
        return output::print_json(&item);
    }

    let tags = item
        .tags()
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    output::print_details(&[
        ("ID", item.id().to_string()),
        ("Title", item.title().to_string()),
        ("Slug", item.slug().to_string()),
        ("Status", item.status().to_string()),
        ("URL", output::opt(item.url())),
        ("Published", output::opt(item.published_at())),
        ("Tags", tags),
        ("Excerpt", output::opt(item.excerpt())),
    ]);
    Ok(())
}

/// Read and parse a source document, abandoning the read on cancellation.
async fn read_document(
    client: &AdminClient<'_>,
    file: &Path,
) -> ghostwriter_shared::Result<ParsedContent> {
    client.cancellable(parse_file(file)).await
}

async fn cmd_create<R: ContentRecord>(
    ctx: &Ctx<'_>,
    file: &Path,
    status: Option<PostStatus>,
    publish_at: Option<String>,
) -> Result<()> {
    let doc = read_document(&ctx.client, file).await?;
    let payload = create_payload(&doc, status, publish_at)?;

    let created: R = create(&ctx.client, &payload, &html_source()).await?;
    info!(id = created.id(), collection = R::COLLECTION, "created");

    if ctx.json() {
        return output::print_json(&created);
    }

    println!("Created {}: {}", R::SINGULAR, created.title());
    output::print_details(&[
        ("  ID", created.id().to_string()),
        ("  Slug", created.slug().to_string()),
        ("  Status", created.status().to_string()),
        ("  URL", output::opt(created.url())),
    ]);
    Ok(())
}

async fn cmd_update<R: ContentRecord>(
    ctx: &Ctx<'_>,
    ident: &str,
    file: Option<&Path>,
    status: Option<PostStatus>,
    publish_at: Option<String>,
) -> Result<()> {
    let doc = match file {
        Some(file) => Some(read_document(&ctx.client, file).await?),
        None => None,
    };
    let existing: R = find(&ctx.client, ident).await?;

    let payload = update_payload(
        existing.updated_at().map(str::to_string),
        doc.as_ref(),
        status,
        publish_at,
    )?;

    let query = if doc.is_some() {
        html_source()
    } else {
        Default::default()
    };
    let updated: R = update(&ctx.client, existing.id(), &payload, &query).await?;

    if ctx.json() {
        return output::print_json(&updated);
    }

    println!("Updated {}: {}", R::SINGULAR, updated.title());
    output::print_details(&[
        ("  ID", updated.id().to_string()),
        ("  Status", updated.status().to_string()),
    ]);
    Ok(())
}

async fn cmd_delete<R: ContentRecord>(ctx: &Ctx<'_>, ident: &str) -> Result<()> {
    let existing: R = find(&ctx.client, ident).await?;
    delete::<R>(&ctx.client, existing.id()).await?;
    print_deleted(ctx, R::SINGULAR, existing.id(), existing.title())
}

// ---------------------------------------------------------------------------
// Payload merging
// ---------------------------------------------------------------------------

fn frontmatter_status(raw: Option<&str>) -> ghostwriter_shared::Result<Option<PostStatus>> {
    raw.filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .transpose()
}

fn set_if_present(field: &mut Option<String>, value: Option<String>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        *field = Some(v);
    }
}

/// Fields every document contributes, for both create and update.
fn document_fields(payload: &mut PostPayload, fm: &PostFrontmatter, html: &str) {
    payload.html = Some(html.to_string());
    set_if_present(&mut payload.slug, fm.slug.clone());
    set_if_present(&mut payload.custom_excerpt, fm.excerpt.clone());
    set_if_present(&mut payload.meta_title, fm.meta_title.clone());
    set_if_present(&mut payload.meta_description, fm.meta_description.clone());
    set_if_present(&mut payload.feature_image, fm.feature_image.clone());

    let tags = name_refs(&fm.tags);
    if !tags.is_empty() {
        payload.tags = Some(tags);
    }
}

/// Status: flag, then frontmatter, then draft. Publish time: flag, then frontmatter.
pub(super) fn create_payload(
    doc: &ParsedContent,
    status: Option<PostStatus>,
    publish_at: Option<String>,
) -> ghostwriter_shared::Result<PostPayload> {
    let fm = doc.frontmatter()?;
    let mut payload = PostPayload {
        title: Some(fm.title.clone().unwrap_or_default()),
        featured: fm.featured.then_some(true),
        ..Default::default()
    };
    document_fields(&mut payload, &fm, &doc.html);

    payload.status = Some(
        status
            .or(frontmatter_status(fm.status.as_deref())?)
            .unwrap_or(PostStatus::Draft),
    );
    payload.published_at = super::non_empty(publish_at).or(super::non_empty(fm.published_at));
    Ok(payload)
}

/// Merge an optional document and flags over an existing record. Flags win.
pub(super) fn update_payload(
    updated_at: Option<String>,
    doc: Option<&ParsedContent>,
    status: Option<PostStatus>,
    publish_at: Option<String>,
) -> ghostwriter_shared::Result<PostPayload> {
    let mut payload = PostPayload::default();

    if let Some(doc) = doc {
        let fm = doc.frontmatter()?;
        set_if_present(&mut payload.title, fm.title.clone());
        payload.featured = Some(fm.featured);
        payload.status = frontmatter_status(fm.status.as_deref())?;
        document_fields(&mut payload, &fm, &doc.html);
    }

    if status.is_some() {
        payload.status = status;
    }
    if let Some(at) = super::non_empty(publish_at) {
        payload.published_at = Some(at);
    }

    if payload.is_empty() {
        return Err(GhostwriterError::validation("no updates specified"));
    }

    payload.updated_at = updated_at;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostwriter_client::NameRef;
    use ghostwriter_markdown::parse;

    fn doc(src: &str) -> ParsedContent {
        parse(src.as_bytes()).unwrap()
    }

    fn options(cancel: tokio_util::sync::CancellationToken) -> ghostwriter_client::ClientOptions {
        ghostwriter_client::ClientOptions {
            cancel,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn document_read_stops_when_cancelled() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("post.md");
        std::fs::write(&file, "---\ntitle: Hi\n---\nBody\n").unwrap();

        let endpoint =
            ghostwriter_shared::Endpoint::new("https://blog.example.com", "abc123:deadbeef")
                .unwrap();
        let cancel = tokio_util::sync::CancellationToken::new();
        let client = AdminClient::new(&endpoint, options(cancel.clone())).unwrap();

        let parsed = read_document(&client, &file).await.unwrap();
        assert_eq!(parsed.frontmatter().unwrap().title.as_deref(), Some("Hi"));

        cancel.cancel();
        let err = read_document(&client, &file).await.unwrap_err();
        assert!(matches!(err, GhostwriterError::Cancelled));
    }

    #[test]
    fn create_defaults_to_draft() {
        let payload = create_payload(&doc("---\ntitle: Hello\n---\nBody\n"), None, None).unwrap();
        assert_eq!(payload.title.as_deref(), Some("Hello"));
        assert_eq!(payload.status, Some(PostStatus::Draft));
        assert_eq!(payload.html.as_deref(), Some("<p>Body</p>\n"));
        assert!(payload.featured.is_none());
        assert!(payload.tags.is_none());
    }

    #[test]
    fn create_status_flag_beats_frontmatter() {
        let d = doc("---\ntitle: A\nstatus: published\n---\n");
        assert_eq!(
            create_payload(&d, None, None).unwrap().status,
            Some(PostStatus::Published)
        );
        assert_eq!(
            create_payload(&d, Some(PostStatus::Scheduled), None).unwrap().status,
            Some(PostStatus::Scheduled)
        );
    }

    #[test]
    fn create_publish_time_flag_beats_frontmatter() {
        let d = doc("---\ntitle: A\npublished_at: 2024-01-01T00:00:00Z\n---\n");
        let payload = create_payload(&d, None, None).unwrap();
        assert_eq!(payload.published_at.as_deref(), Some("2024-01-01T00:00:00Z"));

        let payload = create_payload(&d, None, Some("2025-06-01T12:00:00Z".into())).unwrap();
        assert_eq!(payload.published_at.as_deref(), Some("2025-06-01T12:00:00Z"));
    }

    #[test]
    fn create_maps_frontmatter_fields() {
        let d = doc(
            "---\ntitle: A\nslug: a\nexcerpt: short\nfeatured: true\ntags: [x, y]\nfeature_image: https://img/a.png\n---\nBody\n",
        );
        let payload = create_payload(&d, None, None).unwrap();
        assert_eq!(payload.slug.as_deref(), Some("a"));
        assert_eq!(payload.custom_excerpt.as_deref(), Some("short"));
        assert_eq!(payload.featured, Some(true));
        assert_eq!(payload.feature_image.as_deref(), Some("https://img/a.png"));
        assert_eq!(
            payload.tags,
            Some(vec![NameRef { name: "x".into() }, NameRef { name: "y".into() }])
        );
    }

    #[test]
    fn bad_frontmatter_status_is_rejected() {
        let err = create_payload(&doc("---\nstatus: live\n---\n"), None, None).unwrap_err();
        assert!(matches!(err, GhostwriterError::Validation { .. }));
    }

    #[test]
    fn update_with_flags_only() {
        let payload =
            update_payload(Some("2024-01-01T00:00:00.000Z".into()), None, Some(PostStatus::Published), None)
                .unwrap();
        assert_eq!(payload.status, Some(PostStatus::Published));
        assert!(payload.html.is_none());
        assert_eq!(payload.updated_at.as_deref(), Some("2024-01-01T00:00:00.000Z"));
    }

    #[test]
    fn update_flag_overrides_document_status() {
        let d = doc("---\ntitle: New\nstatus: draft\n---\nText\n");
        let payload = update_payload(None, Some(&d), Some(PostStatus::Published), None).unwrap();
        assert_eq!(payload.title.as_deref(), Some("New"));
        assert_eq!(payload.status, Some(PostStatus::Published));
        assert_eq!(payload.featured, Some(false));
    }

    #[test]
    fn update_keeps_title_when_document_has_none() {
        let payload = update_payload(None, Some(&doc("Only body\n")), None, None).unwrap();
        assert!(payload.title.is_none());
        assert_eq!(payload.html.as_deref(), Some("<p>Only body</p>\n"));
    }

    #[test]
    fn update_without_changes_is_rejected() {
        let err = update_payload(Some("t".into()), None, None, None).unwrap_err();
        assert_eq!(err.to_string(), "validation error: no updates specified");
    }
}
