pub mod automation;
pub mod conditions;
pub mod config;
pub mod currency;
pub mod dispatch;
pub mod email_provider;
pub mod log;
pub mod logstore;
pub mod providers;
pub mod rates;
pub mod template;
pub mod ui;

use crate::automation::TriggerEvent;
use crate::dispatch::{DispatchOutcome, Dispatcher, SkipReason};
use crate::email_provider::EmailSender;
use crate::logstore::EmailLogStore;
use crate::providers::http_notifier::HttpNotifier;
use crate::providers::simulated::SimulatedSender;
use crate::rates::RateStore;
use anyhow::{Context, Result, ensure};
use comfy_table::Cell;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Rates { refresh: bool },
    Convert { amount: f64, from: String, to: String },
    Dispatch { event: TriggerEvent, data_path: String },
    Logs,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Flowdesk starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let store = RateStore::new(config.currencies.clone());

    match command {
        AppCommand::Rates { refresh } => show_rates(&store, refresh).await,
        AppCommand::Convert { amount, from, to } => convert(&config, &store, amount, &from, &to).await,
        AppCommand::Dispatch { event, data_path } => dispatch_event(&config, event, &data_path).await,
        AppCommand::Logs => show_logs(&config),
    }
}

async fn show_rates(store: &RateStore, refresh: bool) -> Result<()> {
    if refresh {
        store.refresh().await;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Symbol"),
        ui::header_cell("Rate (per USD)"),
    ]);

    for currency in store.currencies() {
        let rate = store.get_rate(&currency.code).await;
        table.add_row(vec![
            Cell::new(&currency.code),
            Cell::new(&currency.name),
            Cell::new(&currency.symbol),
            ui::rate_cell(rate),
        ]);
    }

    println!(
        "{}\n\n{table}",
        ui::style_text("Exchange Rates", ui::StyleType::Title)
    );
    Ok(())
}

async fn convert(
    config: &config::AppConfig,
    store: &RateStore,
    amount: f64,
    from: &str,
    to: &str,
) -> Result<()> {
    ensure!(amount.is_finite(), "Amount must be a finite number");

    let converted = store.convert(amount, from, to).await;
    let rate = store.exchange_rate(from, to).await;

    println!(
        "{} = {}  {}",
        currency::format_amount(&config.currencies, amount, from),
        ui::style_text(
            &currency::format_amount(&config.currencies, converted, to),
            ui::StyleType::TotalValue
        ),
        ui::style_text(&format!("(rate {rate:.6})"), ui::StyleType::Subtle)
    );
    Ok(())
}

async fn dispatch_event(
    config: &config::AppConfig,
    event: TriggerEvent,
    data_path: &str,
) -> Result<()> {
    let data_str = std::fs::read_to_string(data_path)
        .with_context(|| format!("Failed to read trigger data file: {data_path}"))?;
    let trigger_data: Map<String, Value> = serde_json::from_str(&data_str)
        .with_context(|| format!("Trigger data must be a JSON object: {data_path}"))?;

    let sender: Arc<dyn EmailSender> = match &config.providers.notifier {
        Some(notifier) => Arc::new(HttpNotifier::new(&notifier.base_url)),
        None => {
            info!("No notifier configured, using simulated backend");
            Arc::new(SimulatedSender::new())
        }
    };
    let dispatcher = Dispatcher::new(config.templates.clone(), &config.admin_email, sender);
    let log_store = EmailLogStore::open(&config.data_path()?.join("logs"))?;

    let automations: Vec<_> = config
        .automations
        .iter()
        .filter(|a| a.trigger == event)
        .collect();
    if automations.is_empty() {
        println!("No automations configured for event {event}");
        return Ok(());
    }

    let pb = ui::new_progress_bar(automations.len() as u64, true);
    pb.set_message("Dispatching automations...");

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Automation"),
        ui::header_cell("Recipient"),
        ui::header_cell("Status"),
        ui::header_cell("Subject"),
        ui::header_cell("Error"),
    ]);

    let mut attempted = 0usize;
    for automation in automations {
        let outcome = dispatcher.dispatch(automation, &trigger_data).await?;
        match &outcome {
            DispatchOutcome::Skipped(reason) => {
                let label = match reason {
                    SkipReason::Inactive => "skipped (inactive)",
                    SkipReason::ConditionsNotMet => "skipped (conditions)",
                };
                table.add_row(vec![
                    Cell::new(&automation.name),
                    Cell::new("-"),
                    Cell::new(ui::style_text(label, ui::StyleType::Subtle)),
                    Cell::new("-"),
                    Cell::new("-"),
                ]);
            }
            DispatchOutcome::Attempted(logs) => {
                attempted += logs.len();
                log_store.append_all(logs)?;
                for log in logs {
                    table.add_row(vec![
                        Cell::new(&automation.name),
                        Cell::new(&log.recipient_email),
                        ui::status_cell(log.status),
                        Cell::new(&log.subject),
                        ui::format_optional_cell(log.error.clone(), |e| e),
                    ]);
                }
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "{}\n\n{table}\n\n{} {}",
        ui::style_text(&format!("Dispatch: {event}"), ui::StyleType::Title),
        ui::style_text("Attempts:", ui::StyleType::TotalLabel),
        attempted
    );
    Ok(())
}

fn show_logs(config: &config::AppConfig) -> Result<()> {
    let log_store = EmailLogStore::open(&config.data_path()?.join("logs"))?;
    let logs = log_store.list()?;

    if logs.is_empty() {
        println!("No email logs recorded yet.");
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Sent At"),
        ui::header_cell("Automation"),
        ui::header_cell("Recipient"),
        ui::header_cell("Status"),
        ui::header_cell("Error"),
    ]);

    for log in &logs {
        table.add_row(vec![
            ui::format_optional_cell(log.sent_at, |t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::new(&log.automation_id),
            Cell::new(&log.recipient_email),
            ui::status_cell(log.status),
            ui::format_optional_cell(log.error.clone(), |e| e),
        ]);
    }

    println!(
        "{}\n\n{table}",
        ui::style_text("Email Logs", ui::StyleType::Title)
    );
    Ok(())
}
