// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the Calibra access-control engine.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration sections with validation
//! - Consistent environment variable naming (`CALIBRA_*`)
//!
//! # Usage
//!
//! ```ignore
//! use calibra_config::load_config;
//!
//! let config = load_config()?;
//! println!("class-level checks: {}", config.abac.class_level_checks);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::CalibraConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct CalibraConfig {
	pub abac: AbacConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`CALIBRA_*`)
/// 2. Config file (`/etc/calibra/calibra.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<CalibraConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<CalibraConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge the given sources in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<CalibraConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = CalibraConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: CalibraConfigLayer) -> Result<CalibraConfig, ConfigError> {
	let abac = layer.abac.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&logging)?;

	info!(
		class_level_checks = %abac.class_level_checks,
		trace_decisions = abac.trace_decisions,
		log_level = %logging.level,
		"configuration loaded"
	);

	Ok(CalibraConfig { abac, logging })
}

/// Validate cross-field configuration rules.
fn validate_config(logging: &LoggingConfig) -> Result<(), ConfigError> {
	if logging.level.trim().is_empty() {
		return Err(ConfigError::Validation(
			"logging.level must not be blank".to_string(),
		));
	}

	Ok(())
}
