use clap::{Args, Subcommand};
use color_eyre::eyre::Result;
use ghostwriter_client::models::Newsletter;
use ghostwriter_client::{
    NewsletterPayload, NewsletterStatus, create, ensure_has_updates, find, update,
};

use super::{Ctx, ListArgs, fetch_listing, non_empty};
use crate::output::{self, Table};

#[derive(Subcommand)]
pub(crate) enum NewsletterAction {
    /// List newsletters.
    List(ListArgs),

    /// Get a newsletter by ID or slug.
    Get { id_or_slug: String },

    /// Create a newsletter.
    Create {
        name: String,

        #[command(flatten)]
        fields: NewsletterFields,
    },

    /// Update a newsletter.
    Update {
        id_or_slug: String,

        /// New newsletter name.
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        fields: NewsletterFields,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct NewsletterFields {
    #[arg(long)]
    pub slug: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub sender_name: Option<String>,

    #[arg(long)]
    pub sender_email: Option<String>,

    /// Reply-to address: newsletter, support, or an email.
    #[arg(long)]
    pub reply_to: Option<String>,

    /// Status: active or archived.
    #[arg(long)]
    pub status: Option<NewsletterStatus>,

    /// Subscribe new members on signup (true/false).
    #[arg(long)]
    pub subscribe_on_signup: Option<bool>,
}

impl NewsletterFields {
    fn into_payload(self, name: Option<String>) -> NewsletterPayload {
        NewsletterPayload {
            name: non_empty(name),
            slug: non_empty(self.slug),
            description: non_empty(self.description),
            sender_name: non_empty(self.sender_name),
            sender_email: non_empty(self.sender_email),
            sender_reply_to: non_empty(self.reply_to),
            status: self.status,
            subscribe_on_signup: self.subscribe_on_signup,
        }
    }
}

pub(crate) async fn run(ctx: &Ctx<'_>, action: NewsletterAction) -> Result<()> {
    match action {
        NewsletterAction::List(args) => {
            let newsletters: Vec<Newsletter> = fetch_listing(ctx, &args).await?;
            if ctx.json() {
                return output::print_json(&newsletters);
            }

            let mut table = Table::new(&["ID", "NAME", "STATUS", "VISIBILITY"]);
            for nl in &newsletters {
                table.row([
                    nl.id.clone(),
                    output::truncate(&nl.name, 40),
                    nl.status.clone(),
                    nl.visibility.clone(),
                ]);
            }
            table.print();
            Ok(())
        }
        NewsletterAction::Get { id_or_slug } => {
            let nl: Newsletter = find(&ctx.client, &id_or_slug).await?;
            show(ctx, &nl)
        }
        NewsletterAction::Create { name, fields } => {
            let payload = fields.into_payload(Some(name));
            let nl: Newsletter = create(&ctx.client, &payload, &Default::default()).await?;
            if !ctx.json() {
                println!("Created newsletter: {}", nl.name);
            }
            show(ctx, &nl)
        }
        NewsletterAction::Update {
            id_or_slug,
            name,
            fields,
        } => {
            let payload = fields.into_payload(name);
            ensure_has_updates(&payload)?;

            let existing: Newsletter = find(&ctx.client, &id_or_slug).await?;
            let nl: Newsletter =
                update(&ctx.client, &existing.id, &payload, &Default::default()).await?;
            if !ctx.json() {
                println!("Updated newsletter: {}", nl.name);
            }
            show(ctx, &nl)
        }
    }
}

fn show(ctx: &Ctx<'_>, nl: &Newsletter) -> Result<()> {
    if ctx.json() {
        return output::print_json(nl);
    }
    output::print_details(&[
        ("ID", nl.id.clone()),
        ("Name", nl.name.clone()),
        ("Slug", nl.slug.clone()),
        ("Status", nl.status.clone()),
        ("Visibility", nl.visibility.clone()),
        ("Sender", output::opt(nl.sender_name.as_deref())),
        ("Sender email", output::opt(nl.sender_email.as_deref())),
        ("Reply-to", output::opt(nl.sender_reply_to.as_deref())),
        ("On signup", nl.subscribe_on_signup.to_string()),
        ("Description", output::opt(nl.description.as_deref())),
    ]);
    Ok(())
}
