use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use flowdesk::automation::TriggerEvent;
use flowdesk::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for flowdesk::AppCommand {
    fn from(cmd: Commands) -> flowdesk::AppCommand {
        match cmd {
            Commands::Rates { refresh } => flowdesk::AppCommand::Rates { refresh },
            Commands::Convert { amount, from, to } => flowdesk::AppCommand::Convert {
                amount,
                from: from.to_uppercase(),
                to: to.to_uppercase(),
            },
            Commands::Dispatch { event, data } => flowdesk::AppCommand::Dispatch {
                event,
                data_path: data,
            },
            Commands::Logs => flowdesk::AppCommand::Logs,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the currency rate table
    Rates {
        /// Re-quote rates with simulated feed jitter first
        #[arg(short, long)]
        refresh: bool,
    },
    /// Convert an amount between currencies
    Convert {
        amount: f64,
        from: String,
        to: String,
    },
    /// Run email automations for a trigger event
    Dispatch {
        /// Trigger event, e.g. invoice_overdue
        #[arg(short, long)]
        event: TriggerEvent,
        /// Path to a JSON file with the trigger payload
        #[arg(short, long)]
        data: String,
    },
    /// Display recorded email logs
    Logs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => flowdesk::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = flowdesk::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
# Reference currency table; rates are units per 1 USD.
currencies:
  - { code: "USD", name: "US Dollar", symbol: "$", rate: 1.0 }
  - { code: "EUR", name: "Euro", symbol: "€", rate: 0.85 }
  - { code: "GBP", name: "British Pound", symbol: "£", rate: 0.73 }
  - { code: "JPY", name: "Japanese Yen", symbol: "¥", rate: 110.0 }
  - { code: "CAD", name: "Canadian Dollar", symbol: "C$", rate: 1.25 }
  - { code: "AUD", name: "Australian Dollar", symbol: "A$", rate: 1.35 }
  - { code: "INR", name: "Indian Rupee", symbol: "₹", rate: 83.12 }

templates:
  - id: invoice_reminder
    name: "Invoice Reminder"
    subject: "Reminder: invoice {{invoice_number}} is overdue"
    content: "<p>Hi {{client_name}}, invoice {{invoice_number}} is {{days_overdue}} days overdue.</p>"
    kind: reminder
    variables: [invoice_number, client_name, days_overdue]
  - id: client_welcome
    name: "Client Welcome"
    subject: "Welcome aboard, {{client_name}}!"
    content: "<p>Welcome {{client_name}}, your team contact is {{account_manager}}.</p>"
    kind: welcome
    variables: [client_name, account_manager]

automations:
  - id: overdue_reminder
    name: "Overdue invoice reminder"
    trigger: invoice_overdue
    template_id: invoice_reminder
    conditions:
      - { field: days_overdue, operator: greater_than, value: 3 }
    recipients: client
  - id: welcome_new_client
    name: "Welcome new client"
    trigger: client_created
    template_id: client_welcome
    recipients: client

# providers:
#   notifier:
#     base_url: "https://notify.example.com"

admin_email: "admin@agency.com"
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
