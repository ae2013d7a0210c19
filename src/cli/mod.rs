use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::application::{KhataService, Statement};
use crate::domain::{format_cents, parse_cents, period, Cents, EntryType, PartyKind, StatementFilter};

/// Khata - buyer and supplier statements
#[derive(Parser)]
#[command(name = "khata")]
#[command(about = "Invoices, payments and running-balance statements for buyers and suppliers")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "KHATA_DB", default_value = "khata.db")]
    pub database: String,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Buyer and supplier management commands
    #[command(subcommand)]
    Party(PartyCommands),

    /// Record an invoice against a party
    Invoice {
        /// Party name
        party: String,

        /// Invoice number (must be unique)
        number: String,

        /// Nett invoice amount (e.g., "1250.00" or "1250")
        amount: String,

        /// Discount allowed on the invoice
        #[arg(long)]
        discount: Option<String>,

        /// Invoice date (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Record a payment received from a buyer or paid to a supplier
    Payment {
        /// Party name
        party: String,

        /// Amount paid (e.g., "400.00" or "400")
        amount: String,

        /// Settlement discount allowed on top of the amount
        #[arg(long)]
        discount: Option<String>,

        /// Payment date (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,

        /// Description (cheque number, UPI reference, ...)
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Show a party's statement with running balances
    Statement {
        /// Party name
        party: String,

        /// Start date (YYYY-MM-DD); earlier history becomes the opening balance
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<String>,

        /// Rows to show: all, invoice, payment
        #[arg(short = 't', long = "type", default_value = "all")]
        entry_type: String,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,

        /// Output file for json (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Import invoices or payments from CSV
    Import {
        /// What to import: invoices, payments
        import_type: String,

        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,

        /// Create parties that don't exist
        #[arg(long)]
        create_parties: bool,

        /// Kind for created parties: buyer, supplier
        #[arg(long, default_value = "buyer")]
        kind: String,
    },
}

#[derive(Subcommand)]
pub enum PartyCommands {
    /// Create a new buyer or supplier
    Create {
        /// Party name (must be unique)
        name: String,

        /// Party kind: buyer, supplier
        #[arg(short, long)]
        kind: String,

        /// Phone number
        #[arg(long)]
        phone: Option<String>,

        /// Address
        #[arg(long)]
        address: Option<String>,
    },

    /// List parties
    List {
        /// Only show one kind: buyer, supplier
        #[arg(short, long)]
        kind: Option<String>,

        /// Include archived parties
        #[arg(long)]
        all: bool,
    },

    /// Show detailed party information
    Show {
        /// Party name
        name: String,
    },

    /// Archive a party (soft delete)
    Archive {
        /// Party name
        name: String,
    },
}

impl Cli {
    /// Install the tracing subscriber. `RUST_LOG` wins over `--verbose`.
    pub fn init_tracing(&self) {
        let default_level = if self.verbose { "khata=debug" } else { "khata=warn" };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                KhataService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Party(party_cmd) => {
                let service = KhataService::connect(&self.database).await?;
                run_party_command(&service, party_cmd).await?;
            }

            Commands::Invoice {
                party,
                number,
                amount,
                discount,
                date,
            } => {
                let service = KhataService::connect(&self.database).await?;
                let nett_amount =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
                let discount = parse_discount(discount.as_deref())?;
                let created_at = parse_date_or_now(date.as_deref())?;

                let invoice = service
                    .record_invoice(&party, &number, nett_amount, discount, created_at)
                    .await?;

                println!(
                    "Recorded invoice #{} for {}: {}",
                    invoice.invoice_number,
                    party,
                    format_cents(invoice.debit_amount())
                );
            }

            Commands::Payment {
                party,
                amount,
                discount,
                date,
                description,
            } => {
                let service = KhataService::connect(&self.database).await?;
                let amount =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
                let discount = parse_discount(discount.as_deref())?;
                let date = parse_date_or_now(date.as_deref())?;

                let payment = service
                    .record_payment(&party, amount, discount, date, description)
                    .await?;

                println!(
                    "Recorded {} payment for {}: {} ({})",
                    payment.flow_type,
                    party,
                    format_cents(payment.credit_amount()),
                    payment.id
                );
            }

            Commands::Statement {
                party,
                from,
                to,
                entry_type,
                format,
                output,
            } => {
                let service = KhataService::connect(&self.database).await?;
                let filter = parse_filter(from.as_deref(), to.as_deref(), &entry_type)?;
                run_statement_command(&service, &party, filter, &format, output.as_deref())
                    .await?;
            }

            Commands::Import {
                import_type,
                input,
                dry_run,
                create_parties,
                kind,
            } => {
                let service = KhataService::connect(&self.database).await?;
                let kind = PartyKind::from_str(&kind).ok_or_else(|| {
                    anyhow::anyhow!("Invalid party kind '{}'. Valid kinds: buyer, supplier", kind)
                })?;
                run_import_command(
                    &service,
                    &import_type,
                    input.as_deref(),
                    dry_run,
                    create_parties,
                    kind,
                )
                .await?;
            }
        }

        Ok(())
    }
}

async fn run_party_command(service: &KhataService, cmd: PartyCommands) -> Result<()> {
    match cmd {
        PartyCommands::Create {
            name,
            kind,
            phone,
            address,
        } => {
            let kind = PartyKind::from_str(&kind).ok_or_else(|| {
                anyhow::anyhow!("Invalid party kind '{}'. Valid kinds: buyer, supplier", kind)
            })?;

            let party = service.create_party(name, kind, phone, address).await?;
            println!("Created {}: {}", party.kind, party.name);
        }

        PartyCommands::List { kind, all } => {
            let kind = kind
                .map(|k| {
                    PartyKind::from_str(&k)
                        .ok_or_else(|| anyhow::anyhow!("Invalid party kind '{}'", k))
                })
                .transpose()?;

            let parties = service.list_parties(kind, all).await?;
            if parties.is_empty() {
                println!("No parties found.");
            } else {
                println!("{:<25} {:<10} {:<15}", "NAME", "KIND", "PHONE");
                println!("{}", "-".repeat(52));
                for party in parties {
                    println!(
                        "{:<25} {:<10} {:<15}",
                        truncate(&party.name, 25),
                        party.kind,
                        party.phone.as_deref().unwrap_or("")
                    );
                }
            }
        }

        PartyCommands::Show { name } => {
            let info = service.get_party_info(&name).await?;
            let party = &info.party;

            println!("Party: {}", party.name);
            println!("  ID:           {}", party.id);
            println!("  Kind:         {}", party.kind);
            if let Some(phone) = &party.phone {
                println!("  Phone:        {}", phone);
            }
            if let Some(address) = &party.address {
                println!("  Address:      {}", address);
            }
            println!(
                "  Created:      {}",
                party.created_at.format("%Y-%m-%d %H:%M:%S")
            );
            if let Some(archived) = party.archived_at {
                println!("  Archived:     {}", archived.format("%Y-%m-%d %H:%M:%S"));
            }
            println!();
            println!("  Outstanding:  {}", format_cents(info.outstanding));
            println!(
                "  Records:      {} invoices, {} payments",
                info.invoice_count, info.payment_count
            );
            if let Some(last) = info.last_activity {
                println!("  Last activity: {}", last.format("%Y-%m-%d"));
            }
        }

        PartyCommands::Archive { name } => {
            service.archive_party(&name).await?;
            println!("Archived party: {}", name);
        }
    }
    Ok(())
}

async fn run_statement_command(
    service: &KhataService,
    party: &str,
    filter: StatementFilter,
    format: &str,
    output: Option<&str>,
) -> Result<()> {
    match format {
        "table" => {
            let statement = service.statement(party, filter).await?;
            print_statement(&statement);
        }
        "json" => {
            use crate::io::Exporter;
            use std::fs::File;
            use std::io::{stdout, Write};

            let writer: Box<dyn Write> = match output {
                Some(path) => {
                    let file = File::create(path)
                        .with_context(|| format!("Failed to create output file: {}", path))?;
                    Box::new(file)
                }
                None => Box::new(stdout()),
            };

            let export = Exporter::new(service)
                .export_statement_json(party, filter, writer)
                .await?;
            if let Some(path) = output {
                eprintln!(
                    "Exported statement for {} ({} rows) to {}",
                    export.statement.party.name,
                    export.statement.rows.len(),
                    path
                );
            }
        }
        _ => anyhow::bail!("Invalid format '{}'. Valid formats: table, json", format),
    }
    Ok(())
}

fn print_statement(statement: &Statement) {
    let party = &statement.party;
    println!("Statement: {} ({})", party.name, party.kind);

    let from = statement.filter.window_start().map(|d| d.format("%Y-%m-%d").to_string());
    let to = statement.filter.window_end().map(|d| d.format("%Y-%m-%d").to_string());
    println!(
        "Period:    {} to {}",
        from.as_deref().unwrap_or("beginning"),
        to.as_deref().unwrap_or("today")
    );
    if statement.filter.entry_type != EntryType::All {
        println!("Showing:   {} rows only", statement.filter.entry_type);
    }
    println!();

    if statement.rows.is_empty() {
        println!("No transactions found.");
        return;
    }

    println!(
        "{:<12} {:<30} {:>12} {:>12} {:>12}",
        "DATE", "PARTICULARS", "DEBIT", "CREDIT", "BALANCE"
    );
    println!("{}", "-".repeat(82));
    for row in &statement.rows {
        println!(
            "{:<12} {:<30} {:>12} {:>12} {:>12}",
            row.date.format("%Y-%m-%d"),
            truncate(&row.particulars, 30),
            blank_if_zero(row.debit),
            blank_if_zero(row.credit),
            format_cents(row.balance)
        );
    }
    println!("{}", "-".repeat(82));

    let summary = &statement.summary;
    println!(
        "{:<12} {:<30} {:>12} {:>12} {:>12}",
        "",
        "Totals",
        format_cents(summary.total_debit),
        format_cents(summary.total_credit),
        format_cents(summary.closing_balance)
    );
}

async fn run_import_command(
    service: &KhataService,
    import_type: &str,
    input: Option<&str>,
    dry_run: bool,
    create_parties: bool,
    kind: PartyKind,
) -> Result<()> {
    use crate::io::{ImportOptions, Importer};
    use std::fs::File;
    use std::io::{stdin, Read};

    let importer = Importer::new(service);

    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let options = ImportOptions {
        dry_run,
        create_missing_parties: create_parties,
        party_kind: Some(kind),
    };

    let result = match import_type {
        "invoices" => importer.import_invoices_csv(reader, &options).await?,
        "payments" => importer.import_payments_csv(reader, &options).await?,
        _ => anyhow::bail!(
            "Invalid import type '{}'. Valid types: invoices, payments",
            import_type
        ),
    };

    if dry_run {
        println!("Dry run: {} {} would be imported", result.imported, import_type);
    } else {
        println!("Imported {} {}", result.imported, import_type);
    }

    if !result.is_clean() {
        println!("{} line(s) failed:", result.errors.len());
        for error in &result.errors {
            println!("  - {}", error);
        }
        anyhow::bail!("Import finished with errors");
    }

    Ok(())
}

fn parse_filter(from: Option<&str>, to: Option<&str>, entry_type: &str) -> Result<StatementFilter> {
    let entry_type = EntryType::from_str(entry_type).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid type '{}'. Valid types: all, invoice, payment",
            entry_type
        )
    })?;

    let mut filter = StatementFilter::new().with_entry_type(entry_type);
    if let Some(from) = from {
        filter = filter.with_start_date(parse_date(from).context("Invalid --from date")?);
    }
    if let Some(to) = to {
        filter = filter.with_end_date(parse_date(to).context("Invalid --to date")?);
    }
    Ok(filter)
}

fn parse_discount(discount: Option<&str>) -> Result<Cents> {
    discount
        .map(parse_cents)
        .transpose()
        .context("Invalid discount format")
        .map(|d| d.unwrap_or(0))
}

fn parse_date_or_now(date: Option<&str>) -> Result<DateTime<Utc>> {
    match date {
        Some(date_str) => parse_date(date_str),
        None => Ok(Utc::now()),
    }
}

fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    period::parse_date(date_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid date '{}'. Use YYYY-MM-DD", date_str))
}

fn blank_if_zero(cents: Cents) -> String {
    if cents == 0 {
        String::new()
    } else {
        format_cents(cents)
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
