//! Injector settings
//!
//! Settings can be built in code, parsed from TOML, or read from a `.toml` or
//! `.json` file:
//!
//! ```toml
//! auto_inject_external_factories = true
//! auto_inject_local_factories = false
//! search_paths = ["lib", "vendor/lib"]
//! max_resolution_depth = 64
//! default_builtins = true
//! ```

use crate::error::{DiError, DiResult};
use crate::graph::DEFAULT_MAX_RESOLUTION_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Construction-time configuration of an [`Injector`](crate::Injector).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectorSettings {
	/// Invoke factories exported by external packages.
	pub auto_inject_external_factories: bool,
	/// Invoke factories found along the local search paths.
	pub auto_inject_local_factories: bool,
	/// Initial local search paths, in lookup order.
	pub search_paths: Vec<PathBuf>,
	/// Maximum number of simultaneously open resolution frames.
	pub max_resolution_depth: usize,
	/// Install the default built-in facilities into the injector's catalog.
	pub default_builtins: bool,
}

impl Default for InjectorSettings {
	fn default() -> Self {
		Self {
			auto_inject_external_factories: true,
			auto_inject_local_factories: true,
			search_paths: Vec::new(),
			max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
			default_builtins: true,
		}
	}
}

impl InjectorSettings {
	/// Parses settings from TOML; absent keys keep their defaults.
	///
	/// # Examples
	///
	/// ```
	/// use conjure_di::InjectorSettings;
	///
	/// let settings = InjectorSettings::from_toml_str("auto_inject_local_factories = false").unwrap();
	/// assert!(!settings.auto_inject_local_factories);
	/// assert!(settings.auto_inject_external_factories);
	/// ```
	pub fn from_toml_str(text: &str) -> DiResult<Self> {
		let settings: Self = toml::from_str(text).map_err(|e| DiError::Settings(e.to_string()))?;
		settings.validate()
	}

	pub fn from_json_str(text: &str) -> DiResult<Self> {
		let settings: Self =
			serde_json::from_str(text).map_err(|e| DiError::Settings(e.to_string()))?;
		settings.validate()
	}

	/// Reads settings from a `.toml` or `.json` file.
	///
	/// Relative search paths are resolved against the file's directory.
	pub fn from_file(path: impl AsRef<Path>) -> DiResult<Self> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path)?;
		let mut settings = match path.extension().and_then(|ext| ext.to_str()) {
			Some("toml") => Self::from_toml_str(&text)?,
			Some("json") => Self::from_json_str(&text)?,
			other => {
				return Err(DiError::Settings(format!(
					"unsupported settings format: {}",
					other.unwrap_or("<none>")
				)));
			}
		};
		if let Some(base) = path.parent() {
			for search_path in &mut settings.search_paths {
				if search_path.is_relative() {
					*search_path = base.join(&*search_path);
				}
			}
		}
		Ok(settings)
	}

	fn validate(self) -> DiResult<Self> {
		if self.max_resolution_depth == 0 {
			return Err(DiError::Settings(
				"max_resolution_depth must be at least 1".to_string(),
			));
		}
		Ok(self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn defaults_enable_auto_injection() {
		let settings = InjectorSettings::default();
		assert!(settings.auto_inject_external_factories);
		assert!(settings.auto_inject_local_factories);
		assert!(settings.search_paths.is_empty());
		assert_eq!(settings.max_resolution_depth, 100);
	}

	#[rstest]
	fn parses_every_key_from_toml() {
		// Arrange
		let text = r#"
			auto_inject_external_factories = false
			auto_inject_local_factories = false
			search_paths = ["lib", "vendor"]
			max_resolution_depth = 8
			default_builtins = false
		"#;

		// Act
		let settings = InjectorSettings::from_toml_str(text).unwrap();

		// Assert
		assert_eq!(
			settings,
			InjectorSettings {
				auto_inject_external_factories: false,
				auto_inject_local_factories: false,
				search_paths: vec![PathBuf::from("lib"), PathBuf::from("vendor")],
				max_resolution_depth: 8,
				default_builtins: false,
			}
		);
	}

	#[rstest]
	fn rejects_a_zero_depth() {
		let result = InjectorSettings::from_json_str(r#"{"max_resolution_depth": 0}"#);
		assert!(matches!(result, Err(DiError::Settings(_))));
	}

	#[rstest]
	fn rejects_malformed_toml() {
		let result = InjectorSettings::from_toml_str("search_paths = 3");
		assert!(matches!(result, Err(DiError::Settings(_))));
	}

	#[rstest]
	fn file_search_paths_are_relative_to_the_file() {
		// Arrange
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("conjure.toml");
		std::fs::write(&path, "search_paths = [\"lib\", \"/abs\"]\n").unwrap();

		// Act
		let settings = InjectorSettings::from_file(&path).unwrap();

		// Assert
		assert_eq!(settings.search_paths[0], dir.path().join("lib"));
		assert_eq!(settings.search_paths[1], PathBuf::from("/abs"));
	}

	#[rstest]
	fn unknown_file_formats_are_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("conjure.ini");
		std::fs::write(&path, "").unwrap();

		let result = InjectorSettings::from_file(&path);

		assert!(matches!(result, Err(DiError::Settings(_))));
	}
}
