//! CLI command definitions, routing, and tracing setup.

mod images;
mod login;
mod members;
mod newsletters;
mod posts;
mod site;
mod tags;
mod tiers;
mod users;

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use ghostwriter_client::{AdminClient, ApiResource, ClientOptions, Query, list, list_all};
use ghostwriter_shared::{AppConfig, Overrides, load_config};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::output::{self, OutputFormat};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Manage a Ghost site from the terminal.
#[derive(Parser)]
#[command(
    name = "ghostwriter",
    version,
    about = "Command-line client for the Ghost Admin API.",
    long_about = "Command-line client for the Ghost Admin API.\n\n\
        Credentials come from --url/--key, the GHOST_URL and GHOST_ADMIN_KEY\n\
        environment variables, or a profile saved by `ghostwriter login`."
)]
pub(crate) struct Cli {
    /// Ghost site URL.
    #[arg(long, env = "GHOST_URL", global = true)]
    pub url: Option<String>,

    /// Admin API key (`id:secret`).
    #[arg(long, env = "GHOST_ADMIN_KEY", global = true, hide_env_values = true)]
    pub key: Option<String>,

    /// Config profile to use.
    #[arg(short, long, env = "GHOST_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Output format: text or json.
    #[arg(short, long, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    #[command(flatten)]
    Site(SiteCommand),

    /// Save credentials for a Ghost site as a profile.
    Login(login::LoginArgs),

    /// List configured profiles.
    #[command(alias = "profile")]
    Profiles,
}

/// Subcommands that talk to a Ghost site.
#[derive(Subcommand)]
pub(crate) enum SiteCommand {
    /// Manage posts.
    Posts {
        #[command(subcommand)]
        action: posts::PostAction,
    },

    /// Manage pages.
    Pages {
        #[command(subcommand)]
        action: posts::PageAction,
    },

    /// Manage tags.
    Tags {
        #[command(subcommand)]
        action: tags::TagAction,
    },

    /// Manage members.
    Members {
        #[command(subcommand)]
        action: members::MemberAction,
    },

    /// Manage membership tiers.
    Tiers {
        #[command(subcommand)]
        action: tiers::TierAction,
    },

    /// Manage newsletters.
    Newsletters {
        #[command(subcommand)]
        action: newsletters::NewsletterAction,
    },

    /// View staff users.
    Users {
        #[command(subcommand)]
        action: users::UserAction,
    },

    /// Site information.
    Site {
        #[command(subcommand)]
        action: site::SiteAction,
    },

    /// Upload images.
    Images {
        #[command(subcommand)]
        action: images::ImageAction,
    },
}

/// Paging flags shared by `list` subcommands.
#[derive(Args, Debug, Clone)]
pub(crate) struct ListArgs {
    /// Number of items to return.
    #[arg(long, default_value_t = 15)]
    pub limit: u32,

    /// Page number.
    #[arg(long, default_value_t = 1)]
    pub page: u64,

    /// Fetch every page (ignores --limit and --page).
    #[arg(long)]
    pub all: bool,

    /// Server-side filter expression (e.g. `status:draft`).
    #[arg(long)]
    pub filter: Option<String>,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "ghostwriter=warn",
        1 => "ghostwriter=info",
        2 => "ghostwriter=debug",
        _ => "ghostwriter=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// State shared by every site command.
pub(crate) struct Ctx<'a> {
    pub client: AdminClient<'a>,
    pub output: OutputFormat,
    pub page_size: u32,
}

impl Ctx<'_> {
    pub(crate) fn json(&self) -> bool {
        self.output == OutputFormat::Json
    }
}

/// `login` must still run when the config file is broken, since it rewrites it.
fn login_config(loaded: ghostwriter_shared::Result<AppConfig>) -> AppConfig {
    loaded.unwrap_or_else(|e| {
        warn!(error = %e, "ignoring unreadable config");
        AppConfig::default()
    })
}

fn client_options(config: &AppConfig, cancel: CancellationToken) -> ClientOptions {
    ClientOptions {
        timeout: Duration::from_secs(config.defaults.timeout_secs),
        cancel,
    }
}

/// Run the CLI command.
pub(crate) async fn run(cli: Cli, cancel: CancellationToken) -> Result<()> {
    let overrides = Overrides {
        url: cli.url,
        key: cli.key,
        profile: cli.profile,
    };

    let command = match cli.command {
        Command::Site(command) => command,
        Command::Login(args) => {
            let options = client_options(&login_config(load_config()), cancel);
            return login::cmd_login(args, &overrides, options, cli.output).await;
        }
        Command::Profiles => return login::cmd_profiles(&load_config()?, cli.output),
    };

    let config = load_config()?;
    let options = client_options(&config, cancel);

    let endpoint = config.resolve_endpoint(&overrides)?;
    debug!(url = endpoint.base_url(), "resolved endpoint");

    let ctx = Ctx {
        client: AdminClient::new(&endpoint, options)?,
        output: cli.output,
        page_size: config.defaults.page_size,
    };

    match command {
        SiteCommand::Posts { action } => posts::run_posts(&ctx, action).await,
        SiteCommand::Pages { action } => posts::run_pages(&ctx, action).await,
        SiteCommand::Tags { action } => tags::run(&ctx, action).await,
        SiteCommand::Members { action } => members::run(&ctx, action).await,
        SiteCommand::Tiers { action } => tiers::run(&ctx, action).await,
        SiteCommand::Newsletters { action } => newsletters::run(&ctx, action).await,
        SiteCommand::Users { action } => users::run(&ctx, action).await,
        SiteCommand::Site { action } => site::run(&ctx, action).await,
        SiteCommand::Images { action } => images::run(&ctx, action).await,
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// One page, or every page with a spinner when `--all` is set.
pub(crate) async fn fetch_listing<R: ApiResource>(ctx: &Ctx<'_>, args: &ListArgs) -> Result<Vec<R>> {
    let mut extra = Query::new();
    if let Some(filter) = args.filter.as_deref().filter(|f| !f.is_empty()) {
        extra.push("filter", filter);
    }

    if args.all {
        let spinner = output::spinner(format!("Fetching all {}", R::COLLECTION));
        let result = list_all::<R>(&ctx.client, ctx.page_size, &extra).await;
        spinner.finish_and_clear();
        return Ok(result?);
    }

    Ok(list::<R>(&ctx.client, args.limit, args.page, &extra).await?.items)
}

/// Print the `{deleted, name}` confirmation for a removed record.
pub(crate) fn print_deleted(ctx: &Ctx<'_>, singular: &str, id: &str, label: &str) -> Result<()> {
    if ctx.json() {
        return output::print_json(&serde_json::json!({ "deleted": id, "name": label }));
    }
    println!("Deleted {singular}: {label} ({id})");
    Ok(())
}

/// Blank strings from flags mean "not given".
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
