//! checkout-cli
//!
//! Drives one checkout page view from the terminal. Page data and endpoints
//! come from the environment (see `CheckoutConfig`); page events are read
//! from stdin, one per line (see `command`).

mod command;
mod view;

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkout_core::{CheckoutForm, CheckoutPage, SyncOutcome};
use checkout_payments::CheckoutConfig;

use crate::command::Command;
use crate::view::TerminalView;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = CheckoutConfig::from_env().context("loading checkout configuration")?;
    let page_data = config.page_data().context("reading page data")?;

    let view = Arc::new(TerminalView::new());
    let page = CheckoutPage::new(
        &page_data,
        Arc::new(config.provider()),
        config.reconciler()?,
        Arc::new(config.backend()),
        view.clone(),
        config.csrf_token.clone(),
    );

    println!("checkout {} ready (total {})", page.page_view(), page_data.order_total.value());
    println!("commands: points <n> | card <error>|ok | submit <form.json> | quit");

    let mut syncs = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        while let Some(done) = syncs.try_join_next() {
            log_sync(done);
        }

        let Some(command) = Command::parse(&line) else {
            if !line.trim().is_empty() {
                println!("unknown command: {}", line.trim());
            }
            continue;
        };

        match command {
            // Display and ticket are settled here; only the amount update runs
            // in the background
            Command::Points(raw) => {
                syncs.spawn(page.discount.on_points_input(&raw));
            }
            Command::Card(event) => page.payment.on_card_change(&event),
            Command::Submit(path) => {
                let form = match read_form(&path).await {
                    Ok(form) => form,
                    Err(e) => {
                        println!("could not read form: {e:#}");
                        continue;
                    }
                };

                let outcome = page.payment.submit(&form).await;
                println!("submit: {}", serde_json::to_string(&outcome)?);
            }
            Command::Quit => break,
        }

        if view.reload_requested() || view.submitted() {
            break;
        }
    }

    finish_syncs(&mut syncs).await;

    if view.submitted() {
        tracing::info!(page_view = %page.page_view(), "Order form submitted");
    } else if view.reload_requested() {
        tracing::warn!(page_view = %page.page_view(), "Page reload requested, exiting");
    }

    Ok(())
}

/// Wait for sync tasks still running; returns how many there were
async fn finish_syncs(syncs: &mut JoinSet<SyncOutcome>) -> usize {
    let pending = syncs.len();
    if pending > 0 {
        tracing::info!(pending, "Waiting for discount syncs to finish");
    }
    while let Some(done) = syncs.join_next().await {
        log_sync(done);
    }
    pending
}

fn log_sync(done: Result<SyncOutcome, tokio::task::JoinError>) {
    match done {
        Ok(outcome) => tracing::debug!(?outcome, "Points input handled"),
        Err(e) => tracing::error!(error = %e, "Discount sync task failed"),
    }
}

async fn read_form(path: &std::path::Path) -> anyhow::Result<CheckoutForm> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_finish_syncs_waits_for_running_tasks() {
        let mut syncs = JoinSet::new();
        for delay in [30, 10] {
            syncs.spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                SyncOutcome::NoHandle
            });
        }

        assert_eq!(finish_syncs(&mut syncs).await, 2);
        assert!(syncs.is_empty());
        assert_eq!(finish_syncs(&mut syncs).await, 0);
    }
}
