use clap::{Args, Subcommand};
use color_eyre::eyre::Result;
use ghostwriter_client::models::Tier;
use ghostwriter_client::{TierPayload, TierVisibility, create, ensure_has_updates, find, update};

use super::{Ctx, ListArgs, fetch_listing, non_empty};
use crate::output::{self, Table};

/// Currency applied to new paid tiers when none is given.
const DEFAULT_CURRENCY: &str = "usd";

#[derive(Subcommand)]
pub(crate) enum TierAction {
    /// List tiers.
    List(ListArgs),

    /// Get a tier by ID or slug.
    Get { id_or_slug: String },

    /// Create a tier.
    Create {
        name: String,

        #[command(flatten)]
        fields: TierFields,
    },

    /// Update a tier.
    Update {
        id_or_slug: String,

        /// New tier name.
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        fields: TierFields,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct TierFields {
    #[arg(long)]
    pub slug: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Monthly price in minor units (cents).
    #[arg(long)]
    pub monthly_price: Option<u64>,

    /// Yearly price in minor units (cents).
    #[arg(long)]
    pub yearly_price: Option<u64>,

    /// Currency code, e.g. usd.
    #[arg(long)]
    pub currency: Option<String>,

    /// Visibility: public or none.
    #[arg(long)]
    pub visibility: Option<TierVisibility>,

    /// Trial period in days.
    #[arg(long)]
    pub trial_days: Option<u32>,

    /// Set active status (true/false).
    #[arg(long)]
    pub active: Option<bool>,

    #[arg(long)]
    pub welcome_page_url: Option<String>,
}

impl TierFields {
    fn into_payload(self, name: Option<String>) -> TierPayload {
        TierPayload {
            name: non_empty(name),
            slug: non_empty(self.slug),
            description: non_empty(self.description),
            monthly_price: self.monthly_price,
            yearly_price: self.yearly_price,
            currency: non_empty(self.currency).map(|c| c.to_lowercase()),
            visibility: self.visibility,
            trial_days: self.trial_days,
            active: self.active,
            welcome_page_url: non_empty(self.welcome_page_url),
        }
    }
}

fn create_payload(name: String, fields: TierFields) -> TierPayload {
    let mut payload = fields.into_payload(Some(name));
    let priced = payload.monthly_price.is_some() || payload.yearly_price.is_some();
    if priced && payload.currency.is_none() {
        payload.currency = Some(DEFAULT_CURRENCY.to_string());
    }
    payload
}

pub(crate) async fn run(ctx: &Ctx<'_>, action: TierAction) -> Result<()> {
    match action {
        TierAction::List(args) => {
            let tiers: Vec<Tier> = fetch_listing(ctx, &args).await?;
            if ctx.json() {
                return output::print_json(&tiers);
            }

            let mut table = Table::new(&["ID", "NAME", "TYPE", "ACTIVE", "MONTHLY", "YEARLY"]);
            for tier in &tiers {
                table.row([
                    tier.id.clone(),
                    output::truncate(&tier.name, 40),
                    tier.kind.clone(),
                    tier.active.to_string(),
                    output::price(tier.monthly_price, tier.currency.as_deref()),
                    output::price(tier.yearly_price, tier.currency.as_deref()),
                ]);
            }
            table.print();
            Ok(())
        }
        TierAction::Get { id_or_slug } => {
            let tier: Tier = find(&ctx.client, &id_or_slug).await?;
            show(ctx, &tier)
        }
        TierAction::Create { name, fields } => {
            let payload = create_payload(name, fields);
            let tier: Tier = create(&ctx.client, &payload, &Default::default()).await?;
            if !ctx.json() {
                println!("Created tier: {}", tier.name);
            }
            show(ctx, &tier)
        }
        TierAction::Update {
            id_or_slug,
            name,
            fields,
        } => {
            let payload = fields.into_payload(name);
            ensure_has_updates(&payload)?;

            let existing: Tier = find(&ctx.client, &id_or_slug).await?;
            let tier: Tier = update(&ctx.client, &existing.id, &payload, &Default::default()).await?;
            if !ctx.json() {
                println!("Updated tier: {}", tier.name);
            }
            show(ctx, &tier)
        }
    }
}

fn show(ctx: &Ctx<'_>, tier: &Tier) -> Result<()> {
    if ctx.json() {
        return output::print_json(tier);
    }
    output::print_details(&[
        ("ID", tier.id.clone()),
        ("Name", tier.name.clone()),
        ("Slug", tier.slug.clone()),
        ("Type", tier.kind.clone()),
        ("Active", tier.active.to_string()),
        ("Visibility", tier.visibility.clone()),
        ("Monthly", output::price(tier.monthly_price, tier.currency.as_deref())),
        ("Yearly", output::price(tier.yearly_price, tier.currency.as_deref())),
        ("Trial days", tier.trial_days.map(|d| d.to_string()).unwrap_or_default()),
        ("Description", output::opt(tier.description.as_deref())),
    ]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priced_tier_gets_default_currency() {
        let payload = create_payload(
            "Gold".into(),
            TierFields {
                monthly_price: Some(500),
                ..Default::default()
            },
        );
        assert_eq!(payload.currency.as_deref(), Some("usd"));
        assert_eq!(payload.name.as_deref(), Some("Gold"));
    }

    #[test]
    fn free_tier_has_no_currency() {
        let payload = create_payload("Free".into(), TierFields::default());
        assert!(payload.currency.is_none());
    }

    #[test]
    fn update_sends_only_given_fields() {
        let payload = TierFields {
            trial_days: Some(7),
            currency: Some("EUR".into()),
            ..Default::default()
        }
        .into_payload(None);

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({"currency": "eur", "trial_days": 7})
        );
    }
}
