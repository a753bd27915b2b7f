use clap::Subcommand;
use color_eyre::eyre::Result;
use ghostwriter_client::models::User;
use ghostwriter_client::{Query, find, list};

use super::Ctx;
use crate::output::{self, Table};

#[derive(Subcommand)]
pub(crate) enum UserAction {
    /// List staff users.
    List {
        /// Number of users to return.
        #[arg(long, default_value_t = 15)]
        limit: u32,
    },

    /// Get a user by ID or slug.
    Get { id_or_slug: String },
}

fn role_names(user: &User) -> String {
    user.roles
        .iter()
        .map(|r| r.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) async fn run(ctx: &Ctx<'_>, action: UserAction) -> Result<()> {
    match action {
        UserAction::List { limit } => {
            let users = list::<User>(&ctx.client, limit, 1, &Query::new()).await?.items;
            if ctx.json() {
                return output::print_json(&users);
            }

            let mut table = Table::new(&["ID", "NAME", "EMAIL", "ROLE", "STATUS"]);
            for user in &users {
                table.row([
                    user.id.clone(),
                    user.name.clone(),
                    user.email.clone(),
                    role_names(user),
                    user.status.clone(),
                ]);
            }
            table.print();
            Ok(())
        }
        UserAction::Get { id_or_slug } => {
            let user: User = find(&ctx.client, &id_or_slug).await?;
            if ctx.json() {
                return output::print_json(&user);
            }

            output::print_details(&[
                ("ID", user.id.clone()),
                ("Name", user.name.clone()),
                ("Slug", user.slug.clone()),
                ("Email", user.email.clone()),
                ("Roles", role_names(&user)),
                ("Status", user.status.clone()),
                ("Location", output::opt(user.location.as_deref())),
                ("Website", output::opt(user.website.as_deref())),
                ("Bio", output::opt(user.bio.as_deref())),
                ("Last seen", output::opt(user.last_seen.as_deref())),
                ("URL", output::opt(user.url.as_deref())),
            ]);
            Ok(())
        }
    }
}
