mod db;
mod error;
mod extract;
mod fetch;
mod harvest;
mod normalize;
mod report;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mercado_scraper", about = "Supermarket price scraper with a SQLite catalog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest all sites and rebuild the catalog table
    Scrape {
        /// Pages to fetch per site
        #[arg(short = 'n', long, default_value_t = harvest::PAGES_PER_SITE)]
        pages: u32,
    },
    /// Insert one record, stamped with today's date
    Insert {
        #[arg(long)]
        site: String,
        #[arg(long)]
        product: String,
        #[arg(long)]
        price: f64,
    },
    /// Show one record by index
    Show { id: i64 },
    /// Delete one record by index
    Delete { id: i64 },
    /// Rewrite one record's site, product and price
    Edit {
        id: i64,
        #[arg(long)]
        site: String,
        #[arg(long)]
        product: String,
        #[arg(long)]
        price: f64,
    },
    /// Catalog overview table
    List {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Write the statistics report
    Report {
        /// Output file
        #[arg(short, long, default_value = "report.html")]
        out: PathBuf,
    },
    /// Interactive menu over the catalog
    Menu,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Scrape { pages } => scrape(pages, today).await,
        Commands::Insert { site, product, price } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let id = db::insert(&conn, &site, &product, price, today)?;
            println!("Inserted record {}.", id);
            Ok(())
        }
        Commands::Show { id } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            match db::find_by_id(&conn, id)? {
                Some(row) => print_row(&row),
                None => println!("No record with index {}.", id),
            }
            Ok(())
        }
        Commands::Delete { id } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            if db::delete(&conn, id)? {
                println!("Record {} deleted.", id);
            } else {
                println!("No record with index {}.", id);
            }
            Ok(())
        }
        Commands::Edit { id, site, product, price } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            db::update(&conn, id, &site, &product, price)?;
            println!("Record {} updated.", id);
            Ok(())
        }
        Commands::List { limit } => list(limit),
        Commands::Report { out } => write_report(&out),
        Commands::Menu => menu_loop(today),
    }
}

async fn scrape(pages: u32, today: NaiveDate) -> anyhow::Result<()> {
    let client = fetch::build_client().context("failed to build HTTP client")?;

    println!(
        "Harvesting {} sites, {} pages each...",
        harvest::SITES.len(),
        pages
    );
    let outcome = harvest::harvest_all(&client, pages, today).await;

    if !outcome.failures.is_empty() {
        println!("{} pages contributed nothing:", outcome.failures.len());
        for f in &outcome.failures {
            println!("  {} page {} ({}): {}", f.site, f.page, f.url, f.error);
        }
    }
    if outcome.records.is_empty() {
        anyhow::bail!("harvest produced no records; catalog left untouched");
    }

    let conn = db::connect()?;
    let written = db::bulk_replace(&conn, &outcome.records)?;
    println!("Catalog rebuilt with {} records.", written);
    Ok(())
}

fn list(limit: usize) -> anyhow::Result<()> {
    let conn = db::connect()?;
    db::init_schema(&conn)?;
    let rows = db::fetch_all(&conn)?;
    if rows.is_empty() {
        println!("Catalog is empty. Run 'scrape' first.");
        return Ok(());
    }

    println!(
        "{:>5} | {:<10} | {:<40} | {:>8} | {:<10}",
        "#", "Site", "Product", "Price", "Date"
    );
    println!("{}", "-".repeat(85));
    for row in rows.iter().take(limit) {
        println!(
            "{:>5} | {:<10} | {:<40} | {:>8.2} | {:<10}",
            row.index,
            truncate(&row.site, 10),
            truncate(&row.product, 40),
            row.price,
            row.captured_on
        );
    }
    if rows.len() > limit {
        println!("... {} more rows", rows.len() - limit);
    }
    Ok(())
}

fn write_report(out: &PathBuf) -> anyhow::Result<()> {
    let conn = db::connect()?;
    db::init_schema(&conn)?;
    let rows = db::fetch_all(&conn)?;
    let html = report::render_report(&rows)?;
    std::fs::write(out, html).with_context(|| format!("failed to write {}", out.display()))?;
    println!("Report written to {}.", out.display());
    Ok(())
}

// ── Interactive menu ──

fn menu_loop(today: NaiveDate) -> anyhow::Result<()> {
    loop {
        println!();
        println!("Options:");
        println!("1 - Insert record");
        println!("2 - Delete record");
        println!("3 - Edit record");
        println!("4 - Generate report");
        println!("5 - Exit");

        let choice = prompt("Option: ")?;
        let result = match choice.as_str() {
            "1" => menu_insert(today),
            "2" => menu_delete(),
            "3" => menu_edit(),
            "4" => write_report(&PathBuf::from("report.html")),
            "5" => break,
            other => {
                println!("Unknown option: {}", other);
                Ok(())
            }
        };
        // A failed operation reports and returns to the menu.
        if let Err(e) = result {
            println!("Operation failed: {:#}", e);
        }
    }
    println!("Goodbye.");
    Ok(())
}

fn menu_insert(today: NaiveDate) -> anyhow::Result<()> {
    let site = prompt("Site name: ")?;
    let product = prompt("Product name: ")?;
    let price = normalize::parse_price(&prompt("Price: ")?)?;

    let conn = db::connect()?;
    db::init_schema(&conn)?;
    let id = db::insert(&conn, &site, &product, price, today)?;
    println!("Inserted record {}.", id);
    Ok(())
}

fn menu_delete() -> anyhow::Result<()> {
    let id: i64 = prompt("Index of the record to DELETE: ")?.parse()?;

    let conn = db::connect()?;
    db::init_schema(&conn)?;
    match db::find_by_id(&conn, id)? {
        Some(row) => print_row(&row),
        None => {
            println!("No record with index {}.", id);
            return Ok(());
        }
    }

    if prompt("Really delete this record, y/n? ")? == "y" {
        db::delete(&conn, id)?;
        println!("Record {} deleted.", id);
    } else {
        println!("Kept.");
    }
    Ok(())
}

fn menu_edit() -> anyhow::Result<()> {
    let id: i64 = prompt("Index of the record to edit: ")?.parse()?;

    let conn = db::connect()?;
    db::init_schema(&conn)?;
    match db::find_by_id(&conn, id)? {
        Some(row) => print_row(&row),
        None => {
            println!("No record with index {}.", id);
            return Ok(());
        }
    }

    let site = prompt("Site name: ")?;
    let product = prompt("Product name: ")?;
    let price = normalize::parse_price(&prompt("Price: ")?)?;
    db::update(&conn, id, &site, &product, price)?;
    println!("Record {} updated.", id);
    Ok(())
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_row(row: &db::CatalogRow) {
    println!(
        "[{}] {} | {} | {:.2} | {}",
        row.index, row.site, row.product, row.price, row.captured_on
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
