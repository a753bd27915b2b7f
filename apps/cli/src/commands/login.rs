//! `login` and `profiles`: interactive credential setup and profile listing.

use clap::Args;
use color_eyre::eyre::Result;
use dialoguer::{Input, Password};
use ghostwriter_client::{AdminClient, AdminKey, ClientOptions, site_info};
use ghostwriter_shared::{
    AppConfig, Endpoint, GhostwriterError, Overrides, Profile, list_profiles, normalize_base_url,
    save_profile,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::output::{self, OutputFormat, Table};

/// Profile name used when none is given.
const DEFAULT_PROFILE: &str = "default";

#[derive(Args, Debug)]
pub(crate) struct LoginArgs {
    /// Name to save the profile under (falls back to --profile, then "default").
    #[arg(value_name = "PROFILE")]
    pub name: Option<String>,

    /// Make this the default profile.
    #[arg(long)]
    pub default: bool,

    /// Don't open the integrations page in a browser.
    #[arg(long)]
    pub no_browser: bool,
}

/// Page in Ghost admin where a new custom integration (and its key) is created.
fn integrations_url(base_url: &str) -> String {
    format!("{base_url}/ghost/#/settings/integrations/new")
}

fn open_browser(url: &str) {
    let mut command = if cfg!(target_os = "macos") {
        std::process::Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        std::process::Command::new("xdg-open")
    };

    if let Err(e) = command.arg(url).spawn() {
        warn!(error = %e, "could not open browser");
    }
}

/// Run a blocking terminal prompt off the runtime so Ctrl-C can abandon it.
async fn prompt<F>(cancel: &CancellationToken, ask: F) -> Result<String>
where
    F: FnOnce() -> dialoguer::Result<String> + Send + 'static,
{
    let answer = tokio::task::spawn_blocking(ask);
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GhostwriterError::Cancelled.into()),
        joined = answer => Ok(joined??),
    }
}

fn profile_name(args: &LoginArgs, overrides: &Overrides) -> String {
    args.name
        .as_deref()
        .or(overrides.profile.as_deref())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_PROFILE)
        .to_string()
}

/// Prompt for (or take from flags) a site URL and admin key, verify them, and save a profile.
pub(crate) async fn cmd_login(
    args: LoginArgs,
    overrides: &Overrides,
    options: ClientOptions,
    format: OutputFormat,
) -> Result<()> {
    let name = profile_name(&args, overrides);

    let raw_url = match overrides.url.as_deref().filter(|u| !u.trim().is_empty()) {
        Some(url) => url.to_string(),
        None => {
            prompt(&options.cancel, || {
                Input::<String>::new()
                    .with_prompt("Ghost site URL")
                    .interact_text()
            })
            .await?
        }
    };
    let url = normalize_base_url(&raw_url)?;

    let key = match overrides.key.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(key) => key.trim().to_string(),
        None => {
            let page = integrations_url(&url);
            eprintln!("Create a custom integration and copy its Admin API key:");
            eprintln!("  {page}");
            if !args.no_browser {
                open_browser(&page);
            }
            prompt(&options.cancel, || {
                Password::new().with_prompt("Admin API key").interact()
            })
            .await?
            .trim()
            .to_string()
        }
    };

    AdminKey::parse(&key)?;
    let endpoint = Endpoint::new(&url, key.clone())?;
    let client = AdminClient::new(&endpoint, options)?;

    let spinner = output::spinner("Verifying credentials");
    let site = site_info(&client).await;
    spinner.finish_and_clear();
    let site = site?;
    debug!(title = %site.title, version = %site.version, "credentials verified");

    let path = save_profile(&name, Profile { url, key }, args.default)?;

    if format == OutputFormat::Json {
        return output::print_json(&serde_json::json!({
            "profile": name,
            "site": site.title,
            "config": path.display().to_string(),
        }));
    }

    println!("Connected to: {} ({})", site.title, site.url);
    println!("Saved profile '{name}' to {}", path.display());
    println!();
    println!("Try:");
    println!("  ghostwriter --profile {name} posts list");
    println!("  ghostwriter --profile {name} site info");
    Ok(())
}

const NO_PROFILES: &str = "No profiles configured. Run 'ghostwriter login' to set up.";

fn render_profiles(names: &[String], default: Option<&str>) -> String {
    let mut table = Table::new(&["PROFILE", "DEFAULT"]);
    for name in names {
        let marker = if Some(name.as_str()) == default { "*" } else { "" };
        table.row([name.as_str(), marker]);
    }
    table.render()
}

/// List configured profiles, marking the default.
pub(crate) fn cmd_profiles(config: &AppConfig, format: OutputFormat) -> Result<()> {
    let (names, default) = list_profiles(config);

    if format == OutputFormat::Json {
        return output::print_json(&serde_json::json!({
            "profiles": names,
            "default": default,
        }));
    }

    if names.is_empty() {
        println!("{NO_PROFILES}");
        return Ok(());
    }

    print!("{}", render_profiles(&names, default.as_deref()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(name: Option<&str>) -> LoginArgs {
        LoginArgs {
            name: name.map(str::to_string),
            default: false,
            no_browser: true,
        }
    }

    #[test]
    fn profile_name_precedence() {
        let overrides = Overrides {
            profile: Some("work".into()),
            ..Default::default()
        };
        assert_eq!(profile_name(&args(Some("blog")), &overrides), "blog");
        assert_eq!(profile_name(&args(None), &overrides), "work");
        assert_eq!(profile_name(&args(None), &Overrides::default()), "default");
        assert_eq!(profile_name(&args(Some("  ")), &Overrides::default()), "default");
    }

    #[tokio::test]
    async fn prompt_gives_way_to_cancellation() {
        let cancel = CancellationToken::new();
        let answer = prompt(&cancel, || Ok("https://blog.example.com".to_string()))
            .await
            .unwrap();
        assert_eq!(answer, "https://blog.example.com");

        cancel.cancel();
        let err = prompt(&cancel, || {
            std::thread::sleep(std::time::Duration::from_millis(200));
            Ok(String::new())
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GhostwriterError>(),
            Some(GhostwriterError::Cancelled)
        ));
    }

    #[test]
    fn integrations_page_under_admin() {
        assert_eq!(
            integrations_url("https://blog.example.com"),
            "https://blog.example.com/ghost/#/settings/integrations/new"
        );
    }

    #[test]
    fn profiles_table_marks_default() {
        let rendered = render_profiles(&["blog".into(), "work".into()], Some("work"));
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].starts_with("PROFILE"));
        assert!(!lines[1].contains('*'));
        assert!(lines[2].starts_with("work") && lines[2].trim_end().ends_with('*'));
    }
}
