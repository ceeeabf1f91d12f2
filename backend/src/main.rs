//! Soul Sales CLI - Normalize daily transaction exports
//!
//! # Main Commands
//!
//! ```bash
//! soul-sales run                       # Build data/formatted_output.csv
//! soul-sales summary --region north    # Daily totals for the chart
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! soul-sales inspect data/daily_sales_data_0.csv   # Show detected encoding/columns
//! soul-sales config                                # Print effective configuration
//! ```

use clap::{Parser, Subcommand};
use chrono::NaiveDate;
use soul_sales::logs::{log_error, log_info, log_success, log_warning, LogFormat, LOGGER};
use soul_sales::{
    compare_around, daily_totals, load_sales_table, load_source, run, write_report,
    PipelineConfig, RegionFilter,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "soul-sales")]
#[command(about = "Normalize Soul Foods transaction exports into a Pink Morsel sales table", long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides shared by commands that build a configuration
#[derive(clap::Args)]
struct ConfigArgs {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source table (repeat for several; replaces configured sources)
    #[arg(short, long = "source")]
    sources: Vec<PathBuf>,

    /// Output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Target product name
    #[arg(short, long)]
    product: Option<String>,

    /// Source delimiter (auto-detect if not specified)
    #[arg(short, long)]
    delimiter: Option<char>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write the normalized table
    Run {
        #[command(flatten)]
        config: ConfigArgs,

        /// Also write a JSON run report
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Load one source table and show what was detected
    Inspect {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Daily sales totals from a normalized table
    Summary {
        /// Normalized table (default: configured output)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Region to keep, or "all"
        #[arg(short, long, default_value = "all")]
        region: String,

        /// Marker date splitting before/after (YYYY-MM-DD)
        #[arg(short, long)]
        marker: Option<NaiveDate>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    LOGGER.set_format(cli.log_format);
    LOGGER.set_quiet(cli.quiet);

    let result = match cli.command {
        Commands::Run { config, report } => cmd_run(&config, report.as_deref()),

        Commands::Inspect { input, delimiter } => cmd_inspect(&input, delimiter),

        Commands::Summary {
            input,
            region,
            marker,
            json,
            config,
        } => cmd_summary(input.as_deref(), &region, marker, json, config.as_deref()),

        Commands::Config { config } => cmd_config(&config),
    };

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn build_config(args: &ConfigArgs) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = PipelineConfig::load(args.config.as_deref())?;

    if !args.sources.is_empty() {
        config.sources = args.sources.clone();
    }
    if let Some(ref output) = args.output {
        config.output = output.clone();
    }
    if let Some(ref product) = args.product {
        config.product = product.clone();
    }
    if args.delimiter.is_some() {
        config.delimiter = args.delimiter;
    }

    config.validate()?;
    Ok(config)
}

fn cmd_run(args: &ConfigArgs, report_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(args)?;
    log_info(format!(
        "📄 Processing {} source(s) for '{}'",
        config.sources.len(),
        config.product
    ));

    let outcome = run(&config)?;
    let report = &outcome.report;

    log_info(format!("Total records processed: {}", report.total_rows));
    log_info(format!("{} records: {}", config.product, report.matched_rows));
    if report.matched_rows == 0 {
        log_warning(format!("No rows matched '{}'", config.product));
    }

    if let Some(path) = report_path {
        write_report(report, path)?;
        log_success(format!("Report written to: {}", path.display()));
    }

    log_success("Done!");
    Ok(())
}

fn cmd_inspect(input: &Path, delimiter: Option<char>) -> Result<(), Box<dyn std::error::Error>> {
    log_info(format!("📄 Inspecting: {}", input.display()));

    let source = load_source(input, delimiter)?;

    println!("Encoding:  {}", source.encoding);
    println!(
        "Delimiter: '{}'{}",
        format_delimiter(source.delimiter),
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    println!("Columns:   {}", source.headers.join(", "));
    println!("Rows:      {}", source.rows.len());
    Ok(())
}

fn cmd_summary(
    input: Option<&Path>,
    region: &str,
    marker: Option<NaiveDate>,
    json: bool,
    config_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = match input {
        Some(p) => p.to_path_buf(),
        None => PipelineConfig::load(config_path)?.output,
    };
    log_info(format!("📊 Summarizing: {}", path.display()));

    let table = load_sales_table(&path)?;
    let filter = RegionFilter::parse(region);
    let series = daily_totals(&table, &filter)?;
    let comparison = compare_around(&series, marker.unwrap_or_else(soul_sales::summary::default_marker));

    if json {
        let value = serde_json::json!({
            "region": region,
            "series": series,
            "comparison": comparison,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{:<12} {:>14}", "Date", "Sales");
    for day in &series {
        println!("{:<12} {:>14.2}", day.date, day.sales);
    }
    println!();
    println!(
        "Before {}: {} days, average {:.2}",
        comparison.marker, comparison.before.days, comparison.before.daily_average
    );
    println!(
        "From {}:   {} days, average {:.2}",
        comparison.marker, comparison.after.days, comparison.after.daily_average
    );
    if let Some(change) = comparison.average_change() {
        println!("Change: {:+.1}%", change * 100.0);
    }
    Ok(())
}

fn cmd_config(args: &ConfigArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(args)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
