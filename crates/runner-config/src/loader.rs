//! Loading of configuration split across several files.
//!
//! The main file may name other files with `include`. Included files are merged
//! at the top level, and a section may be defined in only one file.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Loads a main configuration file together with its includes.
pub struct ConfigLoader {
	/// Directory relative includes are resolved against
	base_path: PathBuf,
	/// Canonical paths already read, used to reject include cycles
	visited: HashSet<PathBuf>,
	/// File that defined each top-level section
	section_owners: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			visited: HashSet::new(),
			section_owners: HashMap::new(),
		}
	}

	/// Reads `config_path`, merges its includes and parses the result.
	pub async fn load_config(
		&mut self,
		config_path: impl AsRef<Path>,
	) -> Result<Config, ConfigError> {
		let config_path = self.resolve_path(config_path)?;
		let main_content = self.read_resolved(&config_path).await?;
		let main_toml: toml::Value = toml::from_str(&main_content)?;

		let includes = Self::includes_of(&main_toml)?;
		if includes.is_empty() {
			return main_content.parse();
		}

		let merged = self.merge_includes(main_toml, includes, config_path).await?;
		let merged_str = toml::to_string(&merged).map_err(|e| {
			ConfigError::Parse(format!("Failed to serialize combined config: {}", e))
		})?;
		merged_str.parse()
	}

	/// Reads a file once and substitutes environment variables.
	async fn read_resolved(&mut self, path: &Path) -> Result<String, ConfigError> {
		let canonical = path.canonicalize().map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;

		if !self.visited.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical.display()
			)));
		}

		tracing::debug!(path = %canonical.display(), "Reading configuration file");
		let content = tokio::fs::read_to_string(path).await?;
		resolve_env_vars(&content)
	}

	/// Returns the paths listed by `include`, given as a string or an array.
	fn includes_of(toml: &toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
		let Some(include) = toml.get("include") else {
			return Ok(Vec::new());
		};

		if let Some(single) = include.as_str() {
			return Ok(vec![PathBuf::from(single)]);
		}

		let entries = include.as_array().ok_or_else(|| {
			ConfigError::Validation("Include must be a string or array of strings".into())
		})?;
		entries
			.iter()
			.map(|entry| {
				entry.as_str().map(PathBuf::from).ok_or_else(|| {
					ConfigError::Validation("Include array must contain only strings".into())
				})
			})
			.collect()
	}

	/// Merges included files into the main table, rejecting sections defined twice.
	async fn merge_includes(
		&mut self,
		mut main_toml: toml::Value,
		includes: Vec<PathBuf>,
		main_path: PathBuf,
	) -> Result<toml::Value, ConfigError> {
		let main_table = main_toml
			.as_table_mut()
			.ok_or_else(|| ConfigError::Parse("Configuration root must be a table".into()))?;
		main_table.remove("include");
		for key in main_table.keys() {
			self.section_owners.insert(key.clone(), main_path.clone());
		}

		for include in includes {
			let path = self.resolve_path(&include)?;
			let content = self.read_resolved(&path).await?;
			let included: toml::Table = toml::from_str(&content)?;

			for (key, value) in included {
				if let Some(owner) = self.section_owners.get(&key) {
					return Err(ConfigError::Validation(format!(
						"Duplicate section '{}' found in {} and {}. \
						Each top-level section must be unique across all configuration files.",
						key,
						owner.display(),
						path.display()
					)));
				}
				self.section_owners.insert(key.clone(), path.clone());
				main_table.insert(key, value);
			}
		}

		Ok(main_toml)
	}

	fn resolve_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
		let path = path.as_ref();
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		};

		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}

		Ok(resolved)
	}
}
