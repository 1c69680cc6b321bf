// Command-line driver.
//
// Each subcommand loads what it needs once, builds the immutable snapshot or
// validator, and hands the results to the report/output helpers:
// - `score` enriches the whole village dataset and exports it.
// - `regions` lists kabupaten and their kecamatan.
// - `report` produces the filtered dashboard tables and a JSON summary.
// - `validate` checks applicant financials against the benchmark levels.
// - `labels` lists provinces, cities and sectors of the benchmark tables.
// - `suggest` ranks sub-sector labels for a free-text query.
use clap::{Parser, Subcommand, ValueEnum};
use geo_credit::benchmark::{
    BenchmarkTables, BenchmarkValidator, Financials, Location, SectorSelection, ValidationReport,
};
use geo_credit::config::Settings;
use geo_credit::loader::{load_villages, LoadReport};
use geo_credit::normalize::normalize;
use geo_credit::reports::{self, RegionFilter, RegionView};
use geo_credit::snapshot::Snapshot;
use geo_credit::suggest::{suggest, EditDistance, SimilarityStrategy, TokenOverlap};
use geo_credit::types::ExecutiveSummary;
use geo_credit::util::{format_billions, format_int, format_number};
use geo_credit::{output, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Village credit risk scoring and benchmark reasonableness checks.
#[derive(Parser, Debug)]
#[command(name = "geo-credit", version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to ./geo_credit.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for exported CSV/JSON files
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score every village and export the enriched dataset
    Score,
    /// List regions and their sub-regions
    Regions,
    /// Dashboard tables for one region
    Report {
        /// Region (kabupaten); defaults to the first in sorted order
        #[arg(long)]
        region: Option<String>,
        /// Restrict to these sub-regions (kecamatan); repeatable
        #[arg(long = "sub-region")]
        sub_regions: Vec<String>,
    },
    /// Check reported financials against benchmark ceilings
    Validate {
        #[arg(long)]
        province: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        sector: String,
        #[arg(long)]
        sub_sector: String,
        #[arg(long)]
        revenue: f64,
        #[arg(long)]
        cogs: f64,
        #[arg(long)]
        profit: f64,
        /// Requested credit amount, compared with the credit ceiling
        #[arg(long)]
        credit: Option<f64>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the benchmark labels accepted by `validate`
    Labels {
        /// List this province's cities instead of all provinces
        #[arg(long)]
        province: Option<String>,
    },
    /// Suggest benchmark sub-sector labels for a free-text query
    Suggest {
        query: String,
        /// Only consider sub-sectors of this sector
        #[arg(long)]
        sector: Option<String>,
        #[arg(long, value_enum, default_value_t = StrategyArg::Edit)]
        strategy: StrategyArg,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    /// Normalized edit distance
    Edit,
    /// Word overlap
    Tokens,
}

fn init_tracing(verbose: bool) {
    let log_format = std::env::var("GEO_CREDIT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if verbose { "geo_credit=debug" } else { "geo_credit=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so report text on stdout stays clean.
    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        _ => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn print_load_report(report: &LoadReport) {
    println!(
        "Processing dataset... ({} rows read, {} villages loaded)",
        format_int(report.total_rows),
        format_int(report.loaded_rows)
    );
    if report.skipped_rows > 0 {
        println!(
            "Note: {} rows skipped due to missing identity fields or parse errors.",
            format_int(report.skipped_rows)
        );
    }
    if !report.missing_flag_columns.is_empty() {
        println!("Info: no {} column; treated as zero.", report.missing_flag_columns.join("/"));
    }
    println!();
}

fn load_snapshot(settings: &Settings) -> Result<Snapshot> {
    let (records, load_report) = load_villages(&settings.data.villages)?;
    print_load_report(&load_report);
    Ok(Snapshot::build(records, settings.report.sentiment_seed))
}

fn load_validator(settings: &Settings) -> Result<BenchmarkValidator> {
    Ok(BenchmarkValidator::new(BenchmarkTables::load(&settings.data)?))
}

fn handle_score(settings: &Settings) -> Result<()> {
    let snapshot = load_snapshot(settings)?;
    let view = RegionView::all(&snapshot);
    let rows: Vec<_> = view.iter().map(reports::enriched_row).collect();
    let path = output::output_path(&settings.output.dir, "enriched_villages.csv")?;
    output::write_csv(&path, &rows)?;
    output::preview_section(
        "Enriched Villages",
        &rows,
        settings.output.preview_rows,
        Some(path.as_path()),
    );
    output::preview_section("Risk Categories", &reports::category_counts(&view), 4, None);
    output::preview_section("Strategy Quadrants", &reports::quadrant_counts(&view), 4, None);
    Ok(())
}

fn handle_regions(settings: &Settings) -> Result<()> {
    let snapshot = load_snapshot(settings)?;
    for region in snapshot.regions() {
        let subs = snapshot.sub_regions(region);
        println!("{} ({} sub-regions)", region, format_int(subs.len()));
        for sub in subs {
            println!("  - {}", sub);
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ReportSummary<'a> {
    generated_at: String,
    region: &'a str,
    sub_regions: &'a [String],
    #[serde(flatten)]
    summary: &'a ExecutiveSummary,
    dataset_mean_attractiveness: Option<f64>,
    dataset_mean_loan_per_household: Option<f64>,
}

fn handle_report(
    settings: &Settings,
    region: Option<String>,
    sub_regions: Vec<String>,
) -> Result<()> {
    let snapshot = load_snapshot(settings)?;
    let filter = RegionFilter::resolve(&snapshot, region.as_deref(), sub_regions)?;
    let view = filter.view(&snapshot);
    if view.is_empty() {
        println!(
            "No villages match the selected sub-regions. Pick at least one sub-region of {}.",
            filter.region
        );
        return Ok(());
    }
    let cfg = &settings.report;
    let dir = &settings.output.dir;
    let preview = settings.output.preview_rows;

    let summary = reports::executive_summary(&view);
    println!("Executive Summary: {} ({} villages)\n", filter.region, format_int(summary.villages));
    println!("Total Exposure:   {}", format_billions(summary.total_exposure));
    println!("Avg Risk Score:   {}/100", format_number(summary.avg_risk_score, 1));
    println!("Hidden Gems:      {}", format_int(summary.hidden_gems));
    println!("High Risk Areas:  {}\n", format_int(summary.high_risk_areas));

    let quadrants = reports::quadrant_counts(&view);
    let path = output::output_path(dir, "report_quadrants.csv")?;
    output::write_csv(&path, &quadrants)?;
    output::preview_section("Competition Matrix", &quadrants, 4, Some(path.as_path()));

    let sectors = reports::sector_counts(&view);
    let path = output::output_path(dir, "report_sectors.csv")?;
    output::write_csv(&path, &sectors)?;
    output::preview_section("Dominant Sectors", &sectors, preview, Some(path.as_path()));

    let red_ocean = reports::top_saturated_red_ocean(&view, cfg.top_saturated);
    let path = output::output_path(dir, "report_red_ocean.csv")?;
    output::write_csv(&path, &red_ocean)?;
    if red_ocean.is_empty() {
        println!("No Red Ocean areas in this region.\n");
    } else {
        output::preview_section(
            "Most Saturated Areas (Red Ocean)",
            &red_ocean,
            preview,
            Some(path.as_path()),
        );
    }

    let watchlist = reports::risk_watchlist(&view, cfg.watchlist_limit);
    let path = output::output_path(dir, "report_watchlist.csv")?;
    output::write_csv(&path, &watchlist)?;
    if watchlist.is_empty() {
        println!("No high-risk areas.\n");
    } else {
        output::preview_section("Watchlist (High Risk)", &watchlist, preview, Some(path.as_path()));
    }

    let sentiment = reports::top_sentiment(&view, cfg.top_sentiment);
    let path = output::output_path(dir, "report_sentiment.csv")?;
    output::write_csv(&path, &sentiment)?;
    output::preview_section(
        "Market Sentiment (simulated)",
        &sentiment,
        preview,
        Some(path.as_path()),
    );

    let points = reports::map_points(&view, cfg.chart_sample_limit, cfg.sentiment_seed);
    let path = output::output_path(dir, "report_map_points.csv")?;
    output::write_csv(&path, &points)?;
    println!("Map points: {} villages exported to {}\n", format_int(points.len()), path.display());

    let means = snapshot.means();
    let file = ReportSummary {
        generated_at: chrono::Utc::now().to_rfc3339(),
        region: &filter.region,
        sub_regions: &filter.sub_regions,
        summary: &summary,
        dataset_mean_attractiveness: means.map(|m| m.attractiveness),
        dataset_mean_loan_per_household: means.map(|m| m.loan_per_household),
    };
    let path = output::output_path(dir, "summary.json")?;
    output::write_json(&path, &file)?;
    println!("Summary stats written to {}", path.display());
    Ok(())
}

fn print_validation(location: &Location, sector: &SectorSelection, report: &ValidationReport) {
    println!(
        "Region: {}, {} | Business: {} - {}\n",
        location.province, location.city, sector.name, sector.sub_sector
    );
    for level in &report.levels {
        println!("{}", level.level);
        match &level.verdict {
            None => println!("Reference data not found for this combination.\n"),
            Some(verdict) => {
                output::preview_table_rows(&reports::verdict_rows(verdict), 4);
                println!("Overall: {}\n", verdict.status);
            }
        }
    }
    if !report.has_any_match() {
        println!(
            "No benchmark found for this combination. \
             Check the sector and sub-sector labels (try `suggest`)."
        );
    }
}

fn handle_validate(
    settings: &Settings,
    location: Location,
    sector: SectorSelection,
    financials: Financials,
    json: bool,
) -> Result<()> {
    let validator = load_validator(settings)?;
    let sector = sector.normalized();
    let report = validator.validate(&location, &sector, &financials);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_validation(&location, &sector, &report);
    }
    Ok(())
}

fn handle_labels(settings: &Settings, province: Option<&str>) -> Result<()> {
    let validator = load_validator(settings)?;
    match province {
        Some(p) => {
            let cities = validator.cities(p);
            println!("Cities in {} ({}):", p, format_int(cities.len()));
            for city in cities {
                println!("  - {}", city);
            }
        }
        None => {
            let provinces = validator.provinces();
            println!("Provinces ({}):", format_int(provinces.len()));
            for province in provinces {
                println!("  - {}", province);
            }
        }
    }
    println!("\nSectors:");
    for sector in validator.sectors() {
        let subs = validator.sub_sectors(&sector).len();
        println!("  - {} ({} sub-sectors)", sector, format_int(subs));
    }
    Ok(())
}

fn handle_suggest(
    settings: &Settings,
    query: &str,
    sector: Option<&str>,
    strategy: StrategyArg,
    limit: usize,
) -> Result<()> {
    let validator = load_validator(settings)?;
    let candidates = match sector {
        Some(s) => validator.sub_sectors(&normalize(s)),
        None => validator.all_sub_sectors(),
    };
    let strategy: &dyn SimilarityStrategy = match strategy {
        StrategyArg::Edit => &EditDistance,
        StrategyArg::Tokens => &TokenOverlap,
    };
    let ranked = suggest(query, &candidates, strategy, limit);
    if ranked.is_empty() {
        println!("No similar sub-sector labels for \"{}\".", query);
    } else {
        output::preview_table_rows(&ranked, limit);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(dir) = cli.output_dir {
        settings.output.dir = dir;
    }
    match cli.command {
        Commands::Score => handle_score(&settings),
        Commands::Regions => handle_regions(&settings),
        Commands::Report { region, sub_regions } => handle_report(&settings, region, sub_regions),
        Commands::Validate {
            province,
            city,
            sector,
            sub_sector,
            revenue,
            cogs,
            profit,
            credit,
            json,
        } => handle_validate(
            &settings,
            Location { province, city },
            SectorSelection { name: sector, sub_sector },
            Financials { revenue, cogs, profit, requested_credit: credit },
            json,
        ),
        Commands::Labels { province } => handle_labels(&settings, province.as_deref()),
        Commands::Suggest { query, sector, strategy, limit } => {
            handle_suggest(&settings, &query, sector.as_deref(), strategy, limit)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
