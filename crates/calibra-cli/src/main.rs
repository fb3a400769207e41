// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Calibra command-line front end.

use std::path::PathBuf;
use std::process::ExitCode;

use calibra_abac::AbilityOptions;
use calibra_config::{CalibraConfig, LogFormat, LoggingConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::{CheckArgs, GrantsArgs, ValidateArgs};

/// Calibra - evaluate instrument access checks.
#[derive(Parser, Debug)]
#[command(name = "calibra", about = "Calibra access-control checks", version)]
struct Args {
	/// Config file (defaults to /etc/calibra/calibra.toml)
	#[arg(long, global = true, env = "CALIBRA_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// List the roles of the permission table
	Roles,
	/// Print the grants a role receives in an organization
	Grants(GrantsArgs),
	/// Evaluate one access check; exits non-zero when denied
	Check(CheckArgs),
	/// Validate a JSON record against its subject schema
	Validate(ValidateArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
	let args = Args::parse();

	let config = match &args.config {
		Some(path) => calibra_config::load_config_with_file(path.clone())?,
		None => calibra_config::load_config()?,
	};

	init_tracing(&config.logging);
	run(args.command, &config).await
}

async fn run(command: Command, config: &CalibraConfig) -> anyhow::Result<ExitCode> {
	let options = AbilityOptions::from(&config.abac);

	match command {
		Command::Roles => {
			for role in commands::roles() {
				println!("{role}");
			}
		}
		Command::Grants(args) => {
			let grants = commands::grants(&args, options).await?;
			println!("{}", serde_json::to_string_pretty(&grants)?);
		}
		Command::Check(args) => {
			let decision = commands::check(&args, options).await?;
			println!("{}", serde_json::to_string_pretty(&decision)?);
			if !decision.allowed {
				return Ok(ExitCode::FAILURE);
			}
		}
		Command::Validate(args) => {
			let instance = commands::validate(&args)?;
			println!("{}", serde_json::to_string_pretty(&instance)?);
		}
	}

	Ok(ExitCode::SUCCESS)
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(logging: &LoggingConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
	let registry = tracing_subscriber::registry().with(filter);

	match logging.format {
		LogFormat::Json => registry
			.with(
				tracing_subscriber::fmt::layer()
					.json()
					.with_writer(std::io::stderr),
			)
			.init(),
		LogFormat::Pretty => registry
			.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
			.init(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use calibra_abac::SubjectKind;
	use clap::CommandFactory;

	#[test]
	fn cli_definition_is_consistent() {
		Args::command().debug_assert();
	}

	#[test]
	fn parses_check_with_global_config() {
		let tenant = "6f1c2a8e-3b4d-4e5f-9a0b-1c2d3e4f5a6b";
		let args = Args::try_parse_from([
			"calibra",
			"check",
			"--role",
			"EDITOR",
			"--tenant",
			tenant,
			"--action",
			"create",
			"--kind",
			"InstrumentData",
			"--config",
			"/tmp/calibra.toml",
		])
		.unwrap();

		assert_eq!(args.config, Some(PathBuf::from("/tmp/calibra.toml")));
		let Command::Check(check) = args.command else {
			panic!("expected check");
		};
		assert_eq!(check.kind, SubjectKind::InstrumentData);
		assert_eq!(check.tenant.to_string(), tenant);
		assert!(check.subject.is_none());
	}

	#[test]
	fn rejects_unknown_kind() {
		let result = Args::try_parse_from([
			"calibra",
			"validate",
			"--kind",
			"Sensor",
			"record.json",
		]);
		assert!(result.is_err());
	}

	#[tokio::test]
	async fn denied_check_exits_with_failure() {
		let command = Command::Check(CheckArgs {
			role: "VIEWER".to_string(),
			tenant: calibra_abac::TenantId::generate(),
			user: None,
			action: "delete".to_string(),
			kind: SubjectKind::InstrumentData,
			subject: None,
		});
		let code = run(command, &CalibraConfig::default()).await.unwrap();
		assert_eq!(code, ExitCode::FAILURE);
	}
}
