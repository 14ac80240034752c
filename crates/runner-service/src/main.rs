//! Main entry point for the transaction runner.
//!
//! Loads the configuration, applies command-line overrides, validates the run,
//! then submits the planned transfers and follows them until they resolve.
//! The first Ctrl-C stops submission and waits for pending transactions; a
//! second one exits immediately.

use clap::Parser;
use runner_config::{Config, RunOverrides};
use runner_core::{RunEngine, TracingReporter};
use runner_types::{RunOutcome, RunSummary};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod factory_registry;

/// Exit status used when the user interrupts twice.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Command-line arguments for the transaction runner.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	/// Target address, overrides `run.target_address`
	#[arg(long)]
	target: Option<String>,

	/// Number of transfers, overrides `run.count`
	#[arg(long)]
	count: Option<i64>,

	/// Value per transfer in ETH, overrides `run.value`
	#[arg(long)]
	value: Option<String>,

	/// Gas price in gwei, overrides `run.gas_price`
	#[arg(long)]
	gas_price: Option<String>,

	/// Delay between submissions in milliseconds, overrides `run.delay_ms`
	#[arg(long)]
	delay_ms: Option<i64>,

	/// Maximum pending transactions, overrides `run.max_pending`
	#[arg(long)]
	max_pending: Option<i64>,
}

impl Args {
	fn overrides(&self) -> RunOverrides {
		RunOverrides {
			target_address: self.target.clone(),
			count: self.count,
			value: self.value.clone(),
			gas_price: self.gas_price.clone(),
			delay_ms: self.delay_ms,
			max_pending: self.max_pending,
		}
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let config_path = args
		.config
		.to_str()
		.ok_or_else(|| format!("Invalid config path: {}", args.config.display()))?;
	let mut config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.runner.id);

	config.run.apply_overrides(args.overrides());
	let validated = config.run_config()?;
	for warning in &validated.warnings {
		tracing::warn!("{}", warning);
	}

	let cancel = CancellationToken::new();
	spawn_interrupt_handler(cancel.clone());

	let reporter = Arc::new(TracingReporter::new(config.runner.explorer_tx_url.clone()));
	let engine = factory_registry::build_runner_from_config(config, validated.config, reporter)
		.await?
		.with_cancellation_token(cancel);

	let summary = run(&engine).await?;
	println!("{}", format_summary(&summary));

	Ok(())
}

async fn run(engine: &RunEngine) -> Result<RunSummary, Box<dyn std::error::Error>> {
	let handle = engine.start().await?;
	Ok(handle.wait().await?)
}

/// Cancels on the first Ctrl-C and exits the process on the second.
fn spawn_interrupt_handler(cancel: CancellationToken) {
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_err() {
			return;
		}
		tracing::warn!("Interrupted, waiting for pending transactions (Ctrl-C again to exit now)");
		cancel.cancel();

		if tokio::signal::ctrl_c().await.is_ok() {
			tracing::warn!("Interrupted again, exiting");
			std::process::exit(INTERRUPTED_EXIT_CODE);
		}
	});
}

/// Renders the final summary printed when the run ends.
fn format_summary(summary: &RunSummary) -> String {
	let stats = &summary.stats;
	let status = match &summary.outcome {
		RunOutcome::Completed => "completed".to_string(),
		RunOutcome::Cancelled => "stopped by user".to_string(),
		RunOutcome::DrainTimedOut { pending } => {
			format!("gave up waiting for {} pending", pending.len())
		},
	};

	format!(
		"Run {}: {} planned, {} sent, {} confirmed, {} failed",
		status, stats.planned, stats.sent, stats.confirmed, stats.failed
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use runner_types::RunStats;
	use tempfile::tempdir;

	#[test]
	fn test_args_default_values() {
		let args = Args::try_parse_from(["txrunner"]).unwrap();

		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
		assert!(args.count.is_none());
		assert!(args.target.is_none());
	}

	#[test]
	fn test_args_map_to_overrides() {
		let args = Args::try_parse_from([
			"txrunner",
			"--config",
			"base.toml",
			"--count",
			"10",
			"--gas-price",
			"0.2",
			"--max-pending",
			"3",
		])
		.unwrap();

		let overrides = args.overrides();
		assert_eq!(args.config, PathBuf::from("base.toml"));
		assert_eq!(overrides.count, Some(10));
		assert_eq!(overrides.gas_price.as_deref(), Some("0.2"));
		assert_eq!(overrides.max_pending, Some(3));
		assert!(overrides.value.is_none());
		assert!(overrides.delay_ms.is_none());
	}

	#[test]
	fn test_format_summary() {
		let summary = RunSummary {
			outcome: RunOutcome::Completed,
			stats: RunStats {
				planned: 5,
				sent: 4,
				confirmed: 4,
				failed: 1,
				rejected: 1,
			},
		};
		assert_eq!(
			format_summary(&summary),
			"Run completed: 5 planned, 4 sent, 4 confirmed, 1 failed"
		);

		let summary = RunSummary {
			outcome: RunOutcome::DrainTimedOut { pending: vec![3, 4] },
			stats: RunStats::new(5),
		};
		assert!(format_summary(&summary).starts_with("Run gave up waiting for 2 pending"));
	}

	#[tokio::test]
	async fn test_overrides_apply_to_file_config() {
		let temp_dir = tempdir().unwrap();
		let config_path = temp_dir.path().join("config.toml");
		let config_content = r#"
[runner]
id = "test-runner"

[network]
rpc_url = "http://localhost:8545"

[account]
primary = "local"
[account.implementations.local]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"

[run]
target_address = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
count = 100
gas_price = "0.05"
max_pending = 5
"#;
		std::fs::write(&config_path, config_content).unwrap();

		let mut config = Config::from_file(config_path.to_str().unwrap())
			.await
			.unwrap();
		let args = Args::try_parse_from(["txrunner", "--count", "3", "--delay-ms", "250"]).unwrap();
		config.run.apply_overrides(args.overrides());

		let validated = config.run_config().unwrap();
		assert_eq!(validated.config.count, 3);
		assert_eq!(validated.config.max_pending, 5);
		assert_eq!(validated.config.delay, std::time::Duration::from_millis(250));
	}

	#[test]
	fn test_invalid_override_is_rejected() {
		let mut config = runner_config::builders::config::ConfigBuilder::new().build();
		let args = Args::try_parse_from(["txrunner", "--count", "0", "--max-pending", "0"]).unwrap();
		config.run.apply_overrides(args.overrides());

		let error = config.run_config().unwrap_err().to_string();
		assert!(error.contains("Transaction count must be between 1 and 2000."));
		assert!(error.contains("Max pending transactions must be at least 1."));
	}
}
