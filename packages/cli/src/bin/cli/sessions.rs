// ABOUTME: CLI command for issuing bearer sessions
// ABOUTME: Looks a user up by email and optionally provisions the company and user first

use anyhow::{bail, Context};
use chrono::{Duration, Utc};
use clap::Args;
use colored::*;

use rfpdesk_auth::NewUser;
use rfpdesk_config::Config;
use rfpdesk_core::Role;

#[derive(Args)]
pub struct IssueSessionArgs {
    /// Email of the user to sign in
    #[arg(long)]
    email: String,

    /// Create the user in a new company with this name if it does not exist
    #[arg(long)]
    create_company: Option<String>,

    /// Role for a newly created user (buyer or supplier)
    #[arg(long, default_value = "buyer")]
    role: Role,

    /// Display name for a newly created user
    #[arg(long)]
    name: Option<String>,
}

pub async fn run(config: &Config, args: IssueSessionArgs) -> anyhow::Result<()> {
    let state = rfpdesk_cli::build_state(config).await?;
    let now = Utc::now();

    let user = match state.users.find_user_by_email(&args.email).await? {
        Some(user) => user,
        None => {
            let Some(company_name) = args.create_company else {
                bail!(
                    "No user with email {}; pass --create-company to create one",
                    args.email
                );
            };
            let company = state.users.create_company(&company_name, now).await?;
            let user = state
                .users
                .create_user(
                    NewUser {
                        name: args.name.unwrap_or_else(|| args.email.clone()),
                        email: args.email.clone(),
                        role: args.role,
                        company_id: company.id.clone(),
                    },
                    now,
                )
                .await?;
            println!(
                "{} Created {} {} in company {} ({})",
                "✓".green(),
                user.role,
                user.email,
                company.name,
                company.id
            );
            user
        }
    };

    let session = state
        .sessions
        .issue(&user.id, Duration::hours(config.session_ttl_hours), now)
        .await
        .context("Failed to issue session")?;

    println!("{} Session for {} ({})", "✓".green(), user.email, user.role);
    println!("  expires: {}", session.expires_at.to_rfc3339());
    println!("  token:   {}", session.token.bold());

    Ok(())
}
