use anyhow::Result;
use clap::{Parser, Subcommand};
use crossbot::commands::{backtest, reconcile};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "crossbot")]
#[command(about = "A multi-timeframe crossover trading engine and trade reconciler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest the crossover strategy over historical candle data
    Backtest {
        /// Symbol the candle data belongs to
        symbol: String,
        /// Path to the fast (entry) timeframe candle CSV
        #[arg(long = "data-fast", value_name = "PATH")]
        data_fast: PathBuf,
        /// Path to the confirmation timeframe candle CSV; derived hourly
        /// from the fast data when omitted
        #[arg(long = "data-confirmation", value_name = "PATH")]
        data_confirmation: Option<PathBuf>,
        /// Destination for the produced trade log
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// JSON file with strategy and sizing parameter overrides
        #[arg(long = "params", value_name = "PATH")]
        params_file: Option<PathBuf>,
        /// Fast MA period on the entry timeframe
        #[arg(long = "fast-ma")]
        fast_ma_period: Option<usize>,
        /// Slow MA period on the entry timeframe
        #[arg(long = "slow-ma")]
        slow_ma_period: Option<usize>,
        /// Confirmation MA period on the confirmation timeframe
        #[arg(long = "confirmation-ma")]
        confirmation_ma_period: Option<usize>,
        /// ATR period used to size protective levels
        #[arg(long = "atr-period")]
        atr_period: Option<usize>,
    },
    /// Reconcile a candidate trade log against a reference trade log
    Reconcile {
        /// Reference trade log (typically the backtest)
        reference: PathBuf,
        /// Candidate trade log (typically live fills)
        candidate: PathBuf,
        /// Entry-time tolerance in minutes
        #[arg(long = "time-tol-minutes")]
        time_tolerance_minutes: Option<i64>,
        /// Relative entry-price tolerance (0.02 means 2%)
        #[arg(long = "price-tol")]
        price_tolerance: Option<f64>,
        /// Destination CSV for the matched pairs
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting crossbot. Not financial advice. Most retail traders lose money. Use at your own risk.");

    match cli.command {
        Commands::Backtest {
            symbol,
            data_fast,
            data_confirmation,
            output,
            params_file,
            fast_ma_period,
            slow_ma_period,
            confirmation_ma_period,
            atr_period,
        } => backtest::run(
            &symbol,
            &data_fast,
            data_confirmation.as_deref(),
            output.as_deref(),
            params_file.as_deref(),
            backtest::ParamOverrides {
                fast_ma_period,
                slow_ma_period,
                confirmation_ma_period,
                atr_period,
            },
        ),
        Commands::Reconcile {
            reference,
            candidate,
            time_tolerance_minutes,
            price_tolerance,
            output,
        } => reconcile::run(
            &reference,
            &candidate,
            time_tolerance_minutes,
            price_tolerance,
            output.as_deref(),
        ),
    }
}
