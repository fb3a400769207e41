// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::CalibraConfigLayer;
use crate::sections::{AbacConfigLayer, ClassLevelChecks, LogFormat, LoggingConfigLayer};

/// Default location of the system-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/calibra/calibra.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<CalibraConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<CalibraConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(CalibraConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<CalibraConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(CalibraConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: CalibraConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: CALIBRA_<SECTION>_<FIELD>
pub struct EnvSource;

impl EnvSource {
	/// Build a layer from an arbitrary variable lookup.
	pub fn load_from<F>(lookup: F) -> Result<CalibraConfigLayer, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |name: &str| lookup(name).filter(|s| !s.is_empty());

		let abac = AbacConfigLayer {
			class_level_checks: parse_var::<ClassLevelChecks>(
				"CALIBRA_ABAC_CLASS_LEVEL_CHECKS",
				var("CALIBRA_ABAC_CLASS_LEVEL_CHECKS"),
			)?,
			trace_decisions: var("CALIBRA_ABAC_TRACE_DECISIONS").map(|v| parse_bool(&v)),
		};

		let logging = LoggingConfigLayer {
			level: var("CALIBRA_LOG_LEVEL"),
			format: parse_var::<LogFormat>("CALIBRA_LOG_FORMAT", var("CALIBRA_LOG_FORMAT"))?,
		};

		Ok(CalibraConfigLayer {
			abac: Some(abac),
			logging: Some(logging),
		})
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<CalibraConfigLayer, ConfigError> {
		debug!("loading environment variables");
		EnvSource::load_from(|name| std::env::var(name).ok())
	}
}

fn parse_bool(value: &str) -> bool {
	value.eq_ignore_ascii_case("true") || value == "1"
}

fn parse_var<T>(key: &str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
	T: std::str::FromStr<Err = String>,
{
	match value {
		Some(v) => v.parse().map(Some).map_err(|message| ConfigError::InvalidValue {
			key: key.to_string(),
			message,
		}),
		None => Ok(None),
	}
}
