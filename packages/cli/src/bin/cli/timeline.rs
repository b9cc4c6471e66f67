// ABOUTME: CLI command for running timeline ticks outside the HTTP server
// ABOUTME: Ticks one RFP, or sweeps every active RFP that has milestones

use clap::Args;
use colored::*;

use rfpdesk_config::Config;
use rfpdesk_timeline::{TickOptions, TickOutcome};

#[derive(Args)]
pub struct TickArgs {
    /// Only tick this RFP
    #[arg(long)]
    rfp: Option<String>,

    /// Report due actions without applying them
    #[arg(long)]
    dry_run: bool,
}

pub async fn run(config: &Config, args: TickArgs) -> anyhow::Result<()> {
    let state = rfpdesk_cli::build_state(config).await?;
    let options = TickOptions {
        dry_run: args.dry_run,
        triggered_by_user_id: None,
    };

    if let Some(rfp_id) = args.rfp {
        let outcome = state.timeline.run_rfp_timeline_tick(&rfp_id, options).await?;
        print_outcome(&outcome);
        return Ok(());
    }

    if args.dry_run {
        for rfp in state.rfps.list_timeline_candidates().await? {
            let outcome = state
                .timeline
                .run_rfp_timeline_tick(&rfp.id, options.clone())
                .await?;
            print_outcome(&outcome);
        }
        return Ok(());
    }

    let report = state.timeline.tick_all().await?;
    println!(
        "{} Ticked {} RFPs: {} actions applied, {} stages advanced",
        "✓".green(),
        report.rfps_ticked,
        report.actions_applied,
        report.stages_advanced
    );
    for failure in &report.failures {
        println!("  {} {}: {}", "✗".red(), failure.rfp_id, failure.error);
    }

    Ok(())
}

fn print_outcome(outcome: &TickOutcome) {
    let label = if outcome.dry_run { "would apply" } else { "applied" };
    println!(
        "{} {} {} action(s)",
        outcome.rfp_id.bold(),
        label,
        outcome.actions_applied.len()
    );
    for action in &outcome.actions_applied {
        println!("  - {}", action.action.describe());
    }
    if let Some(stage) = outcome.advanced_to {
        println!("  {} advanced to {}", "→".cyan(), stage);
    }
}
