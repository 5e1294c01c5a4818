// src/bin/cli/main.rs - loadwatch CLI

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use loadwatch::observation::{parse_date, today};
use loadwatch::report::{self, ExportFormat, SummaryReport};
use loadwatch::{AlertLevel, ApplicationStartup, Config, TierScheme};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "loadwatch")]
#[command(about = "Track load forecast errors and alert when they exceed thresholds")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file (TOML or JSON); environment variables are used otherwise
    #[arg(long, env = "LOADWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a summary report of recent forecast errors
    Report {
        /// Only report on this model
        #[arg(long)]
        model: Option<String>,

        /// Trailing window in days
        #[arg(long, default_value = "30")]
        days: i64,
    },
    /// Export recent error history
    Export {
        /// Only export this model
        #[arg(long)]
        model: Option<String>,

        /// Trailing window in days
        #[arg(long, default_value = "30")]
        days: i64,

        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: CliExportFormat,

        /// Output file; defaults to a timestamped file under data/
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Evaluate a single forecast against its actual value
    Record {
        #[arg(long)]
        model: String,

        #[arg(long)]
        actual: f64,

        #[arg(long)]
        predicted: f64,

        /// Forecast date (YYYY-MM-DD), defaults to today
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    /// Send a test alert through the messaging channel
    TestAlert {
        #[arg(long, default_value = "TEST_MODEL")]
        model: String,

        #[arg(long, default_value = "7.5")]
        error: f64,

        #[arg(long)]
        message: Option<String>,
    },
    /// Send a connection test message
    TestConnection,
    /// Fill the history with synthetic errors for dashboards and demos
    Generate {
        #[arg(long, default_value = "30")]
        days: i64,

        #[arg(long, num_args = 1.., default_values = ["ARIMA", "LSTM", "GRU", "SMA"])]
        models: Vec<String>,

        /// Replace existing entries instead of only filling gaps
        #[arg(long)]
        clear: bool,
    },
    /// Run the daily evaluation scheduler
    Run {
        /// Evaluate once and exit
        #[arg(long)]
        once: bool,

        /// Date to evaluate with --once, defaults to yesterday
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
}

#[derive(Clone, ValueEnum)]
enum CliExportFormat {
    Csv,
    Json,
}

impl From<CliExportFormat> for ExportFormat {
    fn from(format: CliExportFormat) -> Self {
        match format {
            CliExportFormat::Csv => ExportFormat::Csv,
            CliExportFormat::Json => ExportFormat::Json,
        }
    }
}

fn parse_date_arg(s: &str) -> Result<NaiveDate> {
    Ok(parse_date(s)?)
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Config::from_env(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "loadwatch=debug"
    } else {
        "loadwatch=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config(cli.config.as_ref())?;
    info!("Loaded configuration: {:?}", config.summary());

    let startup = ApplicationStartup::new(config)?;

    let result = match cli.command {
        Commands::Report { model, days } => handle_report(&startup, model, days).await,
        Commands::Export {
            model,
            days,
            format,
            output,
        } => handle_export(&startup, model, days, format.into(), output).await,
        Commands::Record {
            model,
            actual,
            predicted,
            date,
        } => handle_record(&startup, &model, actual, predicted, date).await,
        Commands::TestAlert {
            model,
            error,
            message,
        } => handle_test_alert(&startup, &model, error, message).await,
        Commands::TestConnection => handle_test_connection(&startup).await,
        Commands::Generate {
            days,
            models,
            clear,
        } => handle_generate(&startup, days, models, clear).await,
        Commands::Run { once, date } => handle_run(&startup, once, date).await,
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn handle_report(startup: &ApplicationStartup, model: Option<String>, days: i64) -> Result<()> {
    let store = startup.initialize_store().await?;
    let report = SummaryReport::build(&store, model.as_deref(), days).await?;
    println!("{}", report);
    Ok(())
}

async fn handle_export(
    startup: &ApplicationStartup,
    model: Option<String>,
    days: i64,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let store = startup.initialize_store().await?;
    let path = report::export(
        &store,
        model.as_deref(),
        days,
        format,
        output.as_deref(),
        std::path::Path::new("data"),
    )
    .await?;
    println!("✅ Data exported to {}", path.display());
    Ok(())
}

async fn handle_record(
    startup: &ApplicationStartup,
    model: &str,
    actual: f64,
    predicted: f64,
    date: Option<NaiveDate>,
) -> Result<()> {
    let evaluator = startup.build_evaluator().await?;
    let evaluation = evaluator
        .evaluate_detailed(actual, predicted, model, date)
        .await;

    println!("📊 {} forecast for {}", evaluation.model_name, evaluation.date);
    println!("   Error: {:.2}% ({})", evaluation.error_pct, evaluation.level);
    println!(
        "   Recorded: {}",
        if evaluation.recorded { "✅" } else { "❌" }
    );
    match evaluation.delivered {
        Some(true) => println!("   Alert: ✅ sent"),
        Some(false) => println!("   Alert: ⚠️  delivery failed, the retry queue does not outlive this command"),
        None => {}
    }
    Ok(())
}

async fn handle_test_alert(
    startup: &ApplicationStartup,
    model: &str,
    error_value: f64,
    message: Option<String>,
) -> Result<()> {
    let notifier = startup
        .initialize_notifier()
        .context("Missing TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID")?;

    // Ad-hoc alerts use the info/warning/critical tiers
    let level = AlertLevel::for_error(error_value, TierScheme::Presentation);
    let message = message.unwrap_or_else(|| {
        "Forecast error exceeds acceptable threshold. Manual review recommended.".to_string()
    });

    info!("📨 Sending {} test alert for {} ({:.2}%)", level, model, error_value);
    if notifier
        .send_alert(&message, level, Some(model), Some(error_value))
        .await
    {
        println!("✅ Test alert sent");
        Ok(())
    } else {
        anyhow::bail!("Test alert could not be delivered")
    }
}

async fn handle_test_connection(startup: &ApplicationStartup) -> Result<()> {
    let notifier = startup
        .initialize_notifier()
        .context("Missing TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID")?;

    if notifier.test_connection().await {
        println!("✅ Messaging connection works");
        Ok(())
    } else {
        anyhow::bail!("Messaging connection test failed")
    }
}

async fn handle_generate(
    startup: &ApplicationStartup,
    days: i64,
    models: Vec<String>,
    clear: bool,
) -> Result<()> {
    let store = startup.initialize_store().await?;
    let mut rng = fastrand::Rng::new();
    let history = report::generate_synthetic_history(&models, days, &mut rng);
    let generated: usize = history.values().map(|entries| entries.len()).sum();

    if !store.import(history, clear).await {
        anyhow::bail!("Failed to save generated history");
    }

    let snapshot = store.snapshot().await;
    let total: usize = snapshot.values().map(|entries| entries.len()).sum();
    println!(
        "✅ Generated {} entries; history now holds {} entries for {} models",
        generated,
        total,
        snapshot.len()
    );
    Ok(())
}

async fn handle_run(startup: &ApplicationStartup, once: bool, date: Option<NaiveDate>) -> Result<()> {
    if !once {
        startup.start().await?;
        return Ok(());
    }

    let evaluator = startup.build_evaluator().await?;
    let run = Arc::new(startup.build_run(evaluator));
    let date = date.unwrap_or_else(|| today() - Duration::days(1));
    let summary = run.run_for_date(date).await;

    println!("📊 Evaluation for {}", date);
    match summary.actual {
        Some(actual) => println!("   Actual load: {:.2}", actual),
        None => println!("   ⚠️  No actual load data available"),
    }
    for evaluation in &summary.evaluations {
        println!(
            "   {} → {:.2}% ({})",
            evaluation.model_name, evaluation.error_pct, evaluation.level
        );
    }
    for (model, reason) in &summary.skipped {
        println!("   {} → skipped ({:?})", model, reason);
    }
    Ok(())
}
