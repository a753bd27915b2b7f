use clap::{Args, Subcommand};
use color_eyre::eyre::Result;
use ghostwriter_client::models::Member;
use ghostwriter_client::{MemberPayload, create, delete, ensure_has_updates, find, name_refs, update};

use super::{Ctx, ListArgs, fetch_listing, non_empty, print_deleted};
use crate::output::{self, Table};

#[derive(Subcommand)]
pub(crate) enum MemberAction {
    /// List members (e.g. --filter status:free).
    List(ListArgs),

    /// Get a member by ID or email.
    Get { id_or_email: String },

    /// Create a member.
    Create {
        email: String,

        #[command(flatten)]
        fields: MemberFields,
    },

    /// Update a member.
    Update {
        id_or_email: String,

        #[command(flatten)]
        fields: MemberFields,
    },

    /// Delete a member.
    Delete { id_or_email: String },
}

#[derive(Args, Debug, Default)]
pub(crate) struct MemberFields {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub note: Option<String>,

    /// Comma-separated label names.
    #[arg(long, value_delimiter = ',')]
    pub labels: Vec<String>,
}

impl MemberFields {
    fn into_payload(self, email: Option<String>) -> MemberPayload {
        let labels = name_refs(&self.labels);
        MemberPayload {
            email: non_empty(email),
            name: non_empty(self.name),
            note: non_empty(self.note),
            labels: (!labels.is_empty()).then_some(labels),
        }
    }
}

pub(crate) async fn run(ctx: &Ctx<'_>, action: MemberAction) -> Result<()> {
    match action {
        MemberAction::List(args) => {
            let members: Vec<Member> = fetch_listing(ctx, &args).await?;
            if ctx.json() {
                return output::print_json(&members);
            }

            let mut table = Table::new(&["ID", "EMAIL", "NAME", "STATUS"]);
            for member in &members {
                table.row([
                    member.id.clone(),
                    member.email.clone(),
                    output::or_dash(member.name.as_deref()),
                    member.status.clone(),
                ]);
            }
            table.print();
            Ok(())
        }
        MemberAction::Get { id_or_email } => {
            let member: Member = find(&ctx.client, &id_or_email).await?;
            show(ctx, &member)
        }
        MemberAction::Create { email, fields } => {
            let payload = fields.into_payload(Some(email));
            let member: Member = create(&ctx.client, &payload, &Default::default()).await?;
            if !ctx.json() {
                println!("Created member: {}", member.email);
            }
            show(ctx, &member)
        }
        MemberAction::Update {
            id_or_email,
            fields,
        } => {
            let payload = fields.into_payload(None);
            ensure_has_updates(&payload)?;

            let existing: Member = find(&ctx.client, &id_or_email).await?;
            let member: Member =
                update(&ctx.client, &existing.id, &payload, &Default::default()).await?;
            if !ctx.json() {
                println!("Updated member: {}", member.email);
            }
            show(ctx, &member)
        }
        MemberAction::Delete { id_or_email } => {
            let existing: Member = find(&ctx.client, &id_or_email).await?;
            delete::<Member>(&ctx.client, &existing.id).await?;
            print_deleted(ctx, "member", &existing.id, &existing.email)
        }
    }
}

fn show(ctx: &Ctx<'_>, member: &Member) -> Result<()> {
    if ctx.json() {
        return output::print_json(member);
    }

    let labels = member
        .labels
        .iter()
        .map(|l| l.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let newsletters = member
        .newsletters
        .iter()
        .map(|n| n.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    output::print_details(&[
        ("ID", member.id.clone()),
        ("Email", member.email.clone()),
        ("Name", output::opt(member.name.as_deref())),
        ("Status", member.status.clone()),
        ("Created", output::opt(member.created_at.as_deref())),
        ("Note", output::opt(member.note.as_deref())),
        ("Labels", labels),
        ("Newsletters", newsletters),
    ]);
    Ok(())
}
