use clap::{Args, Subcommand};
use color_eyre::eyre::Result;
use ghostwriter_client::models::Tag;
use ghostwriter_client::{
    TagPayload, TagVisibility, create, delete, ensure_has_updates, find, update,
};

use super::{Ctx, ListArgs, fetch_listing, non_empty, print_deleted};
use crate::output::{self, Table};

#[derive(Subcommand)]
pub(crate) enum TagAction {
    /// List tags.
    List(ListArgs),

    /// Get a tag by ID or slug.
    Get { id_or_slug: String },

    /// Create a tag.
    Create {
        name: String,

        #[command(flatten)]
        fields: TagFields,
    },

    /// Update a tag.
    Update {
        id_or_slug: String,

        /// New tag name.
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        fields: TagFields,
    },

    /// Delete a tag.
    Delete { id_or_slug: String },
}

#[derive(Args, Debug, Default)]
pub(crate) struct TagFields {
    #[arg(long)]
    pub slug: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Feature image URL.
    #[arg(long)]
    pub feature_image: Option<String>,

    /// Visibility: public or internal.
    #[arg(long)]
    pub visibility: Option<TagVisibility>,

    #[arg(long)]
    pub meta_title: Option<String>,

    #[arg(long)]
    pub meta_description: Option<String>,
}

impl TagFields {
    fn into_payload(self, name: Option<String>) -> TagPayload {
        TagPayload {
            name: non_empty(name),
            slug: non_empty(self.slug),
            description: non_empty(self.description),
            feature_image: non_empty(self.feature_image),
            visibility: self.visibility,
            meta_title: non_empty(self.meta_title),
            meta_description: non_empty(self.meta_description),
        }
    }
}

pub(crate) async fn run(ctx: &Ctx<'_>, action: TagAction) -> Result<()> {
    match action {
        TagAction::List(args) => {
            let tags: Vec<Tag> = fetch_listing(ctx, &args).await?;
            if ctx.json() {
                return output::print_json(&tags);
            }

            let mut table = Table::new(&["ID", "NAME", "SLUG", "VISIBILITY"]);
            for tag in &tags {
                table.row([
                    tag.id.clone(),
                    output::truncate(&tag.name, 40),
                    tag.slug.clone(),
                    output::or_dash(tag.visibility.as_deref()),
                ]);
            }
            table.print();
            Ok(())
        }
        TagAction::Get { id_or_slug } => {
            let tag: Tag = find(&ctx.client, &id_or_slug).await?;
            show(ctx, &tag)
        }
        TagAction::Create { name, fields } => {
            let payload = fields.into_payload(Some(name));
            let tag: Tag = create(&ctx.client, &payload, &Default::default()).await?;
            if !ctx.json() {
                println!("Created tag: {}", tag.name);
            }
            show(ctx, &tag)
        }
        TagAction::Update {
            id_or_slug,
            name,
            fields,
        } => {
            let payload = fields.into_payload(name);
            ensure_has_updates(&payload)?;

            let existing: Tag = find(&ctx.client, &id_or_slug).await?;
            let tag: Tag = update(&ctx.client, &existing.id, &payload, &Default::default()).await?;
            if !ctx.json() {
                println!("Updated tag: {}", tag.name);
            }
            show(ctx, &tag)
        }
        TagAction::Delete { id_or_slug } => {
            let existing: Tag = find(&ctx.client, &id_or_slug).await?;
            delete::<Tag>(&ctx.client, &existing.id).await?;
            print_deleted(ctx, "tag", &existing.id, &existing.name)
        }
    }
}

fn show(ctx: &Ctx<'_>, tag: &Tag) -> Result<()> {
    if ctx.json() {
        return output::print_json(tag);
    }
    output::print_details(&[
        ("ID", tag.id.clone()),
        ("Name", tag.name.clone()),
        ("Slug", tag.slug.clone()),
        ("Visibility", output::opt(tag.visibility.as_deref())),
        ("Description", output::opt(tag.description.as_deref())),
        ("Image", output::opt(tag.feature_image.as_deref())),
        ("URL", output::opt(tag.url.as_deref())),
    ]);
    Ok(())
}
