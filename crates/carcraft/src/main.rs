use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use carcraft::client::HttpPredictionApi;
use carcraft::commands;
use carcraft::config::Config;
use carcraft::record::{CarAttributes, RecordId};

#[derive(Parser)]
#[command(name = "carcraft")]
#[command(about = "Carcraft - Car Price Predictions\nPredict, track and export car price estimates")]
#[command(version)]
struct Cli {
  /// Enable verbose logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

/// Car attributes sent with a prediction
#[derive(Args)]
struct CarArgs {
  /// Manufacturer, e.g. Maruti
  #[arg(long)]
  company: String,
  /// Model name, e.g. Swift
  #[arg(long)]
  model: String,
  /// Manufacturing year
  #[arg(long)]
  year: u16,
  /// Distance driven in kilometres
  #[arg(long)]
  kms: u64,
  /// Fuel type, e.g. Petrol
  #[arg(long)]
  fuel: String,
  #[arg(long)]
  transmission: Option<String>,
  #[arg(long)]
  owner: Option<String>,
  #[arg(long)]
  condition: Option<String>,
  #[arg(long)]
  insurance_status: Option<String>,
  #[arg(long)]
  previous_accidents: Option<u32>,
  #[arg(long)]
  num_doors: Option<u8>,
  /// Engine displacement in cc
  #[arg(long)]
  engine_size: Option<u32>,
  /// Power in bhp
  #[arg(long)]
  power: Option<u32>,
  #[arg(long)]
  city: Option<String>,
  #[arg(long)]
  emission_norm: Option<String>,
  #[arg(long)]
  insurance_eligible: Option<String>,
  #[arg(long)]
  maintenance_level: Option<String>,
}

impl From<CarArgs> for CarAttributes {
  fn from(args: CarArgs) -> Self {
    let mut attrs = CarAttributes::new(args.company, args.model, args.year, args.kms, args.fuel);
    attrs.transmission = args.transmission;
    attrs.owner = args.owner;
    attrs.car_condition = args.condition;
    attrs.insurance_status = args.insurance_status;
    attrs.previous_accidents = args.previous_accidents;
    attrs.num_doors = args.num_doors;
    attrs.engine_size = args.engine_size;
    attrs.power = args.power;
    attrs.city = args.city;
    attrs.emission_norm = args.emission_norm;
    attrs.insurance_eligible = args.insurance_eligible;
    attrs.maintenance_level = args.maintenance_level;
    attrs
  }
}

#[derive(Subcommand)]
enum Commands {
  /// Ask the prediction API for a price and keep the result
  Predict {
    #[command(flatten)]
    car: CarArgs,
  },
  /// Store a prediction obtained elsewhere
  Record {
    #[command(flatten)]
    car: CarArgs,
    /// Predicted price
    #[arg(long)]
    price: f64,
    /// Confidence score (0-100)
    #[arg(long)]
    confidence: f64,
  },
  /// List predictions, newest first
  List {
    /// Only show saved predictions
    #[arg(short, long)]
    saved: bool,
    /// Show at most this many predictions
    #[arg(short, long)]
    limit: Option<usize>,
  },
  /// Show one prediction in detail
  Show { id: RecordId },
  /// Toggle the saved flag of a prediction
  Save { id: RecordId },
  /// Record the price the car actually sold for
  Actual { id: RecordId, price: f64 },
  /// Delete a prediction
  Delete {
    id: RecordId,
    /// Skip confirmation prompt
    #[arg(short, long)]
    force: bool,
  },
  /// Delete all predictions
  Clear {
    /// Skip confirmation prompt
    #[arg(short, long)]
    force: bool,
  },
  /// Export predictions as CSV
  Export {
    /// Directory to write car-predictions-<date>.csv into
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
    /// Print the CSV instead of writing a file
    #[arg(long, conflicts_with = "output")]
    stdout: bool,
  },
  /// Show prediction statistics
  Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    if cli.verbose {
      EnvFilter::new("carcraft=debug,warn")
    } else {
      EnvFilter::new("carcraft=warn")
    }
  });
  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

  let config = Config::load()?;
  let mut store = commands::open_store(&config)?;

  match cli.command {
    Commands::Predict { car } => {
      let api = HttpPredictionApi::new(&config)?;
      commands::predict(&mut store, &api, car.into()).await?;
    }
    Commands::Record { car, price, confidence } => {
      commands::record_prediction(&mut store, car.into(), price, confidence)?;
    }
    Commands::List { saved, limit } => {
      commands::list_predictions(&store, saved, limit)?;
    }
    Commands::Show { id } => {
      commands::show_prediction(&store, id)?;
    }
    Commands::Save { id } => {
      commands::toggle_save(&mut store, id)?;
    }
    Commands::Actual { id, price } => {
      commands::add_actual_price(&mut store, id, price)?;
    }
    Commands::Delete { id, force } => {
      commands::delete_prediction(&mut store, id, force)?;
    }
    Commands::Clear { force } => {
      commands::clear_predictions(&mut store, force)?;
    }
    Commands::Export { output, stdout } => {
      if stdout {
        commands::print_csv(&store)?;
      } else {
        commands::export_predictions(&store, &output)?;
      }
    }
    Commands::Stats => {
      commands::show_stats(&store)?;
    }
  }

  Ok(())
}
