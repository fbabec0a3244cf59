//! Plantão CLI
//!
//! Command-line interface for a running Plantão API server:
//! - Log, edit and delete shifts
//! - Mark payments
//! - Show the earnings dashboard
//! - Import/Export spreadsheets

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use plantao::shifts::csv_io::{parse_amount, parse_date};
use plantao::shifts::{read_csv, Shift, ShiftStatus, MAX_IMPORT_BATCH};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plantao")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Shift logbook for medical professionals")]
#[command(long_about = "Plantão keeps track of your shifts, what you were paid and what is still owed.\nAll commands talk to a running Plantão API server.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8082", global = true)]
    pub api_url: String,

    /// Access token for accounts with subscription enforcement
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

/// Filters shared by list, dashboard and export
#[derive(Args, Default)]
pub struct FilterArgs {
    /// First date (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(long, value_parser = parse_date)]
    pub from: Option<NaiveDate>,
    /// Last date (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(long, value_parser = parse_date)]
    pub to: Option<NaiveDate>,
    /// Location name
    #[arg(short, long)]
    pub location: Option<String>,
    /// Payment status (paid, receivable, late)
    #[arg(short, long, value_parser = parse_status)]
    pub status: Option<ShiftStatus>,
}

impl FilterArgs {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(from) = self.from {
            query.push(("from", from.to_string()));
        }
        if let Some(to) = self.to {
            query.push(("to", to.to_string()));
        }
        if let Some(location) = &self.location {
            query.push(("location", location.clone()));
        }
        if let Some(status) = self.status {
            query.push(("status", status.to_string()));
        }
        query
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log a shift
    Add {
        /// Hospital or clinic name
        location: String,
        /// Shift date (YYYY-MM-DD or DD/MM/YYYY)
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        /// Hours worked
        #[arg(value_parser = parse_amount)]
        hours: Decimal,
        /// Gross amount (accepts 1.500,00)
        #[arg(value_parser = parse_amount)]
        gross: Decimal,
        /// Explicit withheld tax (default: derived from the rate)
        #[arg(long, value_parser = parse_amount)]
        tax: Option<Decimal>,
        /// Withholding rate in percent for this shift
        #[arg(long, value_parser = parse_amount)]
        rate: Option<Decimal>,
        /// Payment status
        #[arg(short, long, value_parser = parse_status, default_value = "receivable")]
        status: ShiftStatus,
        /// Invoice number
        #[arg(short, long)]
        invoice: Option<String>,
    },

    /// List shifts
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Mark a shift as paid
    Pay {
        /// Shift id
        id: String,
    },

    /// Change a shift's payment status
    Status {
        /// Shift id
        id: String,
        /// New status (paid, receivable, late)
        #[arg(value_parser = parse_status)]
        status: ShiftStatus,
    },

    /// Edit fields of a shift
    Edit {
        /// Shift id
        id: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_amount)]
        hours: Option<Decimal>,
        #[arg(long, value_parser = parse_amount)]
        gross: Option<Decimal>,
        #[arg(long, value_parser = parse_amount)]
        tax: Option<Decimal>,
        /// Re-derive the tax from the gross amount
        #[arg(long)]
        recompute_tax: bool,
        /// Invoice number (empty string clears it)
        #[arg(long)]
        invoice: Option<String>,
    },

    /// Delete a shift
    Delete {
        /// Shift id
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show earnings totals
    Dashboard {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Search the hospital reference list
    Hospitals {
        /// Part of the name (at least 2 characters)
        query: String,
        /// Maximum results
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Import shifts from CSV
    Import {
        /// Path to CSV file (columns: location, date, hours_worked, gross_amount,
        /// and optionally id, tax_amount, status, invoice_number)
        path: PathBuf,
        /// Dry run (don't actually import)
        #[arg(long)]
        dry_run: bool,
    },

    /// Export shifts
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        /// Export format (csv, json)
        #[arg(long, default_value = "csv")]
        export_format: String,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show server health
    Health,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_status(s: &str) -> Result<ShiftStatus, String> {
    s.parse().map_err(|e: plantao::ShiftError| e.to_string())
}

/// Thin JSON client for the API
struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/api/v1{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = builder.send().await.with_context(|| {
            format!(
                "Cannot connect to Plantão API at {}. Is the server running? (cargo run --bin plantao)",
                self.base_url
            )
        })?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::MULTI_STATUS {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or(text);
        bail!("Request failed ({}): {}", status, message)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .send(self.request(reqwest::Method::GET, path).query(query))
            .await?;
        Ok(response.json().await?)
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &Value,
    ) -> Result<T> {
        let response = self.send(self.request(method, path).json(body)).await?;
        Ok(response.json().await?)
    }
}

#[derive(Deserialize)]
struct ShiftList {
    shifts: Vec<Shift>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let api = ApiClient::new(&cli.api_url, cli.token.clone());
    let json_output = cli.format == "json";

    match cli.command {
        Commands::Add {
            location,
            date,
            hours,
            gross,
            tax,
            rate,
            status,
            invoice,
        } => {
            let body = json!({
                "location": location,
                "date": date,
                "hours_worked": hours,
                "gross_amount": gross,
                "tax_amount": tax,
                "tax_rate_percent": rate,
                "status": status,
                "invoice_number": invoice,
            });

            let shift: Shift = api
                .send_json(reqwest::Method::POST, "/shifts", &body)
                .await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&shift)?);
            } else {
                println!(
                    "Logged {} on {}: gross {} - tax {} = net {} ({})",
                    shift.location,
                    shift.date,
                    shift.gross_amount,
                    shift.tax_amount,
                    shift.net_amount(),
                    shift.id
                );
            }
        }

        Commands::List { filter } => {
            let list: ShiftList = api.get_json("/shifts", &filter.query()).await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&list.shifts)?);
            } else {
                print_shift_table(&list.shifts);
            }
        }

        Commands::Pay { id } => {
            let shift = set_status(&api, &id, ShiftStatus::Paid).await?;
            println!("Marked {} ({}) as paid", shift.location, shift.date);
        }

        Commands::Status { id, status } => {
            let shift = set_status(&api, &id, status).await?;
            println!("{} ({}) is now {}", shift.location, shift.date, shift.status);
        }

        Commands::Edit {
            id,
            location,
            date,
            hours,
            gross,
            tax,
            recompute_tax,
            invoice,
        } => {
            let mut patch = serde_json::Map::new();
            if let Some(location) = location {
                patch.insert("location".into(), json!(location));
            }
            if let Some(date) = date {
                patch.insert("date".into(), json!(date));
            }
            if let Some(hours) = hours {
                patch.insert("hours_worked".into(), json!(hours));
            }
            if let Some(gross) = gross {
                patch.insert("gross_amount".into(), json!(gross));
            }
            if let Some(tax) = tax {
                patch.insert("tax_amount".into(), json!(tax));
            }
            if recompute_tax {
                patch.insert("recompute_tax".into(), json!(true));
            }
            if let Some(invoice) = invoice {
                patch.insert("invoice_number".into(), json!(invoice));
            }
            if patch.is_empty() {
                bail!("Nothing to change. Pass at least one field, e.g. --gross 1500");
            }

            let shift: Shift = api
                .send_json(
                    reqwest::Method::PATCH,
                    &format!("/shifts/{}", urlencoding::encode(&id)),
                    &Value::Object(patch),
                )
                .await?;
            println!("Updated {} ({})", shift.location, shift.date);
        }

        Commands::Delete { id, yes } => {
            let path = format!("/shifts/{}", urlencoding::encode(&id));
            let shift: Shift = api.get_json(&path, &[]).await?;

            if !yes && !confirm(&format!(
                "Delete {} on {} (gross {})?",
                shift.location, shift.date, shift.gross_amount
            ))? {
                println!("Cancelled");
                return Ok(());
            }

            api.send(api.request(reqwest::Method::DELETE, &path)).await?;
            println!("Deleted {}", id);
        }

        Commands::Dashboard { filter } => {
            let summary: Value = api.get_json("/dashboard", &filter.query()).await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_dashboard(&summary);
            }
        }

        Commands::Hospitals { query, limit } => {
            let result: Value = api
                .get_json("/hospitals", &[("q", query), ("limit", limit.to_string())])
                .await?;
            let hospitals = result["hospitals"].as_array().cloned().unwrap_or_default();

            if hospitals.is_empty() {
                println!("No hospitals found (type at least 2 characters).");
            } else {
                println!("{:<45} {:<20} {:<5} {}", "Name", "City", "UF", "Type");
                println!("{}", "-".repeat(85));
                for h in hospitals {
                    println!(
                        "{:<45} {:<20} {:<5} {}",
                        h["name"].as_str().unwrap_or("-"),
                        h["city"].as_str().unwrap_or("-"),
                        h["state"].as_str().unwrap_or("-"),
                        h["facility_type"].as_str().unwrap_or("-")
                    );
                }
            }
        }

        Commands::Import { path, dry_run } => {
            let file = std::fs::File::open(&path)
                .with_context(|| format!("File not found: {:?}", path))?;
            let parsed = read_csv(file);

            println!("Import results:");
            println!("  Rows parsed: {}", parsed.shifts.len());
            println!("  Rows failed: {}", parsed.errors.len());

            if !parsed.errors.is_empty() {
                println!();
                println!("Errors (first 10):");
                for (line, error) in parsed.errors.iter().take(10) {
                    println!("  Line {}: {}", line, error);
                }
            }

            if dry_run {
                println!();
                println!("(Dry run - no data was imported)");
            } else if !parsed.shifts.is_empty() {
                println!();
                println!("Importing shifts...");

                let mut accepted = 0;
                let mut rejected = 0;
                for chunk in parsed.shifts.chunks(MAX_IMPORT_BATCH) {
                    let result: Value = api
                        .send_json(
                            reqwest::Method::POST,
                            "/shifts/batch",
                            &json!({ "shifts": chunk }),
                        )
                        .await?;
                    accepted += result["accepted"].as_u64().unwrap_or(0);
                    rejected += result["rejected"].as_u64().unwrap_or(0);
                    if let Some(errors) = result["errors"].as_array() {
                        for e in errors.iter().take(10) {
                            println!("  Rejected #{}: {}", e["index"], e["error"].as_str().unwrap_or("-"));
                        }
                    }
                }

                println!("  Imported: {}", accepted);
                if rejected > 0 {
                    println!("  Rejected: {}", rejected);
                }
            }
        }

        Commands::Export {
            filter,
            export_format,
            output,
        } => {
            let mut query = filter.query();
            query.push(("format", export_format));

            let response = api
                .send(api.request(reqwest::Method::GET, "/shifts/export").query(&query))
                .await?;
            let data = response.text().await?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &data)?;
                    println!("Exported to {:?}", path);
                }
                None => {
                    print!("{}", data);
                }
            }
        }

        Commands::Health => {
            let response = api
                .client
                .get(format!("{}/health", api.base_url))
                .send()
                .await
                .with_context(|| format!("Cannot connect to Plantão API at {}", api.base_url))?;
            let health: Value = response.json().await?;

            println!("Plantão v{}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("API Status: {}", health["status"].as_str().unwrap_or("unknown"));
            println!("  Storage:  {}", health["storage"].as_str().unwrap_or("unknown"));
            println!(
                "  Profiles: {} ({})",
                health["profiles"].as_str().unwrap_or("unknown"),
                health["profile_store"].as_str().unwrap_or("-")
            );
            println!("  Auth:     {}", health["auth"].as_str().unwrap_or("unknown"));
            println!("  Shifts:   {}", health["shift_count"].as_u64().unwrap_or(0));

            if let Some(uptime) = health["uptime_seconds"].as_u64() {
                println!();
                println!("Uptime: {}", format_duration(uptime));
            }
        }

        Commands::Config { output } => {
            let config = plantao::config::generate_default_config();

            match output {
                Some(path) => {
                    // Create parent directory if needed
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

async fn set_status(api: &ApiClient, id: &str, status: ShiftStatus) -> Result<Shift> {
    api.send_json(
        reqwest::Method::POST,
        &format!("/shifts/{}/status", urlencoding::encode(id)),
        &json!({ "status": status }),
    )
    .await
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "sim"))
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn print_shift_table(shifts: &[Shift]) {
    if shifts.is_empty() {
        println!("No shifts found.");
        println!();
        println!("Log your first shift with:");
        println!("  plantao-cli add \"UPA Santana\" 2024-03-09 12 1500");
        return;
    }

    println!(
        "{:<10} {:<30} {:>6} {:>11} {:>10} {:>11} {:<10} {}",
        "Date", "Location", "Hours", "Gross", "Tax", "Net", "Status", "ID"
    );
    println!("{}", "-".repeat(110));

    for shift in shifts {
        println!(
            "{:<10} {:<30} {:>6} {:>11} {:>10} {:>11} {:<10} {}",
            shift.date,
            truncate(&shift.location, 30),
            shift.hours_worked.normalize(),
            shift.gross_amount,
            shift.tax_amount,
            shift.net_amount(),
            shift.status,
            shift.id
        );
    }

    let (gross, net) = shifts.iter().fold((Decimal::ZERO, Decimal::ZERO), |(gross, net), s| {
        (gross.saturating_add(s.gross_amount), net.saturating_add(s.net_amount()))
    });
    println!("{}", "-".repeat(110));
    println!("{} shifts, gross {}, net {}", shifts.len(), gross, net);
}

fn print_dashboard(summary: &Value) {
    let totals = &summary["totals"];
    let text = |v: &Value| v.as_str().map(str::to_string).unwrap_or_else(|| "-".to_string());

    println!("Shifts:      {}", totals["shift_count"].as_u64().unwrap_or(0));
    println!("Hours:       {}", text(&totals["hours"]));
    println!("Gross:       {}", text(&totals["gross"]));
    println!("Tax:         {}", text(&totals["tax"]));
    println!("Net:         {}", text(&totals["net"]));
    println!("Per shift:   {}", text(&totals["average_gross_per_shift"]));
    println!("Per hour:    {}", text(&totals["average_hourly_rate"]));
    println!();
    println!("Receivable:  {}", text(&summary["receivable_amount"]));
    println!("Late:        {}", text(&summary["late_amount"]));

    if let Some(locations) = summary["by_location"].as_array() {
        if !locations.is_empty() {
            println!();
            println!("{:<35} {:>6} {:>12} {:>10}", "Location", "Shifts", "Gross", "Per hour");
            println!("{}", "-".repeat(66));
            for l in locations {
                println!(
                    "{:<35} {:>6} {:>12} {:>10}",
                    truncate(l["location"].as_str().unwrap_or("-"), 35),
                    l["count"].as_u64().unwrap_or(0),
                    text(&l["gross"]),
                    text(&l["hourly_rate"])
                );
            }
        }
    }

    if let Some(months) = summary["monthly"].as_array() {
        if !months.is_empty() {
            println!();
            println!("{:<8} {:>6} {:>12} {:>12}", "Month", "Shifts", "Gross", "Net");
            println!("{}", "-".repeat(41));
            for m in months {
                println!(
                    "{:<8} {:>6} {:>12} {:>12}",
                    m["month"].as_str().unwrap_or("-"),
                    m["count"].as_u64().unwrap_or(0),
                    text(&m["gross"]),
                    text(&m["net"])
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_add() {
        let cli = Cli::try_parse_from([
            "plantao", "add", "UPA Santana", "09/03/2024", "12", "1.500,00", "--status", "pago",
        ])
        .unwrap();

        match cli.command {
            Commands::Add {
                date, gross, status, ..
            } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
                assert_eq!(gross, Decimal::from(1500));
                assert_eq!(status, ShiftStatus::Paid);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_filter_query() {
        let filter = FilterArgs {
            from: NaiveDate::from_ymd_opt(2024, 1, 1),
            status: Some(ShiftStatus::Late),
            ..Default::default()
        };
        assert_eq!(
            filter.query(),
            vec![("from", "2024-01-01".to_string()), ("status", "late".to_string())]
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("UPA", 10), "UPA");
        assert_eq!(truncate("Hospital São Paulo", 8), "Hospita…");
    }
}
