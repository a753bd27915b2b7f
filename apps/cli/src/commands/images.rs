use std::path::PathBuf;

use clap::Subcommand;
use color_eyre::eyre::Result;
use tracing::info;

use super::Ctx;
use crate::output;

#[derive(Subcommand)]
pub(crate) enum ImageAction {
    /// Upload an image and print its URL.
    Upload {
        file: PathBuf,

        /// Reference name stored with the image.
        #[arg(long = "ref")]
        reference: Option<String>,
    },
}

pub(crate) async fn run(ctx: &Ctx<'_>, action: ImageAction) -> Result<()> {
    match action {
        ImageAction::Upload { file, reference } => {
            let url = ctx.client.upload_image(&file, reference.as_deref()).await?;
            info!(file = %file.display(), %url, "image uploaded");

            if ctx.json() {
                return output::print_json(&serde_json::json!({ "url": url }));
            }
            println!("{url}");
            Ok(())
        }
    }
}
