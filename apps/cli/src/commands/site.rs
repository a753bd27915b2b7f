use clap::Subcommand;
use color_eyre::eyre::Result;
use ghostwriter_client::site_info;

use super::Ctx;
use crate::output;

#[derive(Subcommand)]
pub(crate) enum SiteAction {
    /// Show site title, URL and version.
    Info,
}

pub(crate) async fn run(ctx: &Ctx<'_>, action: SiteAction) -> Result<()> {
    match action {
        SiteAction::Info => {
            let site = site_info(&ctx.client).await?;
            if ctx.json() {
                return output::print_json(&site);
            }

            output::print_details(&[
                ("Title", site.title.clone()),
                ("Description", output::opt(site.description.as_deref())),
                ("URL", site.url.clone()),
                ("Version", site.version.clone()),
                ("Logo", output::opt(site.logo.as_deref())),
                ("Icon", output::opt(site.icon.as_deref())),
            ]);
            Ok(())
        }
    }
}
