//! canteen-forecast - train demand models and forecast tomorrow's sales

use clap::{Args, Parser, Subcommand};
use demand_forecast::insights::{historical_summary, item_insights, menu_plan};
use demand_forecast::{
    CsvObservationStore, ExamPeriod, FileArtifactStore, ForecastConfig, ForecastContext,
    Forecaster, ObservationStore, Region, TimeSlot, TrainingPipeline, Weather,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "canteen-forecast")]
#[command(about = "Next-day demand forecasting for canteen sales", version)]
struct Cli {
    /// JSON config file; defaults apply to anything it leaves out
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the ensemble on a sales CSV and save the bundle
    Train {
        /// Sales CSV file
        #[arg(long)]
        data: PathBuf,

        /// Where to write the bundle
        #[arg(long, default_value = "models/demand.bundle")]
        bundle: PathBuf,

        /// Only train on this owner's records
        #[arg(long)]
        owner: Option<String>,
    },

    /// Forecast the day after the latest sale for every item
    Predict {
        /// Sales CSV file
        #[arg(long)]
        data: PathBuf,

        /// Bundle written by `train`
        #[arg(long, default_value = "models/demand.bundle")]
        bundle: PathBuf,

        #[arg(long)]
        owner: String,

        #[command(flatten)]
        context: ContextArgs,

        /// Only print the top N items
        #[arg(long)]
        top: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Describe an owner's sales history
    Insights {
        /// Sales CSV file
        #[arg(long)]
        data: PathBuf,

        #[arg(long)]
        owner: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Conditions expected for the forecast day
#[derive(Args)]
struct ContextArgs {
    #[arg(long)]
    weather: Option<Weather>,

    #[arg(long)]
    exams: Option<ExamPeriod>,

    #[arg(long)]
    region: Option<Region>,

    #[arg(long)]
    time_slot: Option<TimeSlot>,
}

impl From<ContextArgs> for ForecastContext {
    fn from(args: ContextArgs) -> Self {
        ForecastContext {
            weather: args.weather,
            exams: args.exams,
            region: args.region,
            time_slot: args.time_slot,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ForecastConfig::from_file(path)?,
        None => ForecastConfig::default(),
    };

    match cli.command {
        Commands::Train { data, bundle, owner } => {
            let store = CsvObservationStore::new(data);
            let observations = match owner {
                Some(owner) => store.fetch_observations(&owner)?,
                None => store.fetch_all()?,
            };
            let (model, report) = TrainingPipeline::new(config)?.train(&observations)?;
            FileArtifactStore::write_to(&bundle, &model)?;
            println!("{}", report);
            println!("Bundle written to {}", bundle.display());
        }
        Commands::Predict {
            data,
            bundle,
            owner,
            context,
            top,
            json,
        } => {
            let forecaster = Forecaster::new(FileArtifactStore::read_from(&bundle)?, config.thresholds)?;
            let store = CsvObservationStore::new(data);
            let mut batch = forecaster.forecast_for_owner(&store, &owner, &context.into())?;
            if let Some(n) = top {
                batch.results.truncate(n);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&batch)?);
            } else {
                print!("{}", batch);
                if let Some(summary) = batch.summary() {
                    println!(
                        "Highest demand: {} ({})  Total: {}  Average: {:.1}",
                        summary.highest_item,
                        summary.highest_quantity,
                        summary.total_demand,
                        summary.average_demand
                    );
                }
                if batch.unknown_categories > 0 {
                    println!(
                        "{} unknown or missing categories used the fallback code",
                        batch.unknown_categories
                    );
                }
            }
        }
        Commands::Insights { data, owner, json } => {
            let observations = CsvObservationStore::new(data).fetch_observations(&owner)?;
            let insights = item_insights(&observations);
            let summary = historical_summary(&observations);
            let plan = menu_plan(&observations);

            if json {
                let doc = serde_json::json!({
                    "summary": summary,
                    "items": insights,
                    "menu_plan": plan,
                });
                println!("{}", serde_json::to_string_pretty(&doc)?);
                return Ok(());
            }

            match summary {
                Some(s) => println!(
                    "Most popular: {} ({} units)  Total units: {}  Items: {}",
                    s.most_popular_item, s.most_popular_units, s.total_units, s.items
                ),
                None => println!("No sales recorded for {}", owner),
            }
            for insight in &insights {
                let mut notes = Vec::new();
                if let Some(w) = insight.best_weather {
                    notes.push(format!("sells best when {}", w));
                }
                if let Some(e) = insight.peak_exam_period {
                    notes.push(format!("peaks during {}", e));
                }
                if let Some(t) = insight.best_time_slot {
                    notes.push(format!("busiest in the {}", t));
                }
                notes.push(format!("trend {}", insight.trend));
                println!("{}: {}", insight.item, notes.join(", "));
            }
            for day in &plan {
                println!("{}", day.day);
                for (slot, items) in &day.slots {
                    println!("  {:<10} {}", slot, items.join(", "));
                }
            }
        }
    }

    Ok(())
}
