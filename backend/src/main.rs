//! Ordersplit CLI - Split a marketplace order export into shipping and accounts sheets
//!
//! # Main Commands
//!
//! ```bash
//! ordersplit serve                  # Start HTTP server (port 3000)
//! ordersplit process orders.csv     # Write orders_shipping.csv and orders_accounts.csv
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! ordersplit parse orders.csv       # Dump the order rows as JSON
//! ordersplit costs                  # Show the loaded cost table
//! ```

use clap::{Parser, Subcommand};
use ordersplit::models::format_money;
use ordersplit::transform::format_delimiter;
use ordersplit::{load_orders, process_file, AppConfig, CostTable, ProcessOptions};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ordersplit")]
#[command(about = "Split marketplace order exports into shipping and accounts sheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process an order export and write both sheets next to it
    Process {
        /// Input order export (CSV)
        input: PathBuf,

        /// Cost table (default: ORDERSPLIT_COST_TABLE or ./cost_lookup.csv)
        #[arg(short, long)]
        cost_table: Option<PathBuf>,
    },

    /// Parse an order export and output its rows as JSON
    Parse {
        /// Input order export (CSV)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the cost table
    Costs {
        /// Cost table (default: ORDERSPLIT_COST_TABLE or ./cost_lookup.csv)
        path: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: ORDERSPLIT_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match AppConfig::from_env() {
        Ok(config) => match cli.command {
            Commands::Process { input, cost_table } => cmd_process(&input, cost_table, &config),
            Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),
            Commands::Costs { path } => cmd_costs(path.as_deref().unwrap_or(config.cost_table.as_path())),
            Commands::Serve { port } => cmd_serve(port, config).await,
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_process(
    input: &Path,
    cost_table: Option<PathBuf>,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = ProcessOptions {
        cost_table: cost_table.unwrap_or_else(|| config.cost_table.clone()),
    };

    let output = process_file(input, &options)?;

    eprintln!("\n📦 Shipping: {} buyers", output.shipping_count);
    eprintln!("🧾 Accounts: {} transactions", output.accounts_count);
    if output.unresolved_transactions > 0 {
        eprintln!("   ⚠️  {} without a cost", output.unresolved_transactions);
    }
    println!("{}", output.shipping_path.display());
    println!("{}", output.accounts_path.display());

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let loaded = load_orders(input)?;
    eprintln!("   Encoding: {}", loaded.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(loaded.delimiter));
    eprintln!("   Columns: {}", loaded.headers.join(", "));
    eprintln!("✅ Parsed {} rows", loaded.rows.len());

    let json = serde_json::to_string_pretty(&loaded.rows)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_costs(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let table = CostTable::load(path)?;
    eprintln!("💲 {} item costs in {}\n", table.len(), path.display());

    for (code, cost) in table.sorted_entries() {
        match cost {
            Some(amount) => println!("  {:<20} {}", code, format_money(amount)),
            None => println!("  {:<20} (invalid)", code),
        }
    }

    Ok(())
}

async fn cmd_serve(port: Option<u16>, mut config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port {
        config.port = port;
    }
    ordersplit::server::start_server(config).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
