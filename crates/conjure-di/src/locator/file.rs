//! Data modules on disk
//!
//! Finds `<dir>/<name>.json` or `<dir>/<name>.toml` along the search paths
//! and loads the file as a [`serde_json::Value`]. Modules are keyed by their
//! canonical path, so two search paths reaching the same file share one
//! cache entry.

use super::{Located, Locator};
use crate::dependency::{LocationKey, Origin};
use crate::error::{DiError, DiResult};
use crate::value::Resolved;
use std::path::{Path, PathBuf};

/// Supported module file extensions, in lookup order.
pub const MODULE_EXTENSIONS: &[&str] = &["json", "toml"];

/// [`Locator`] for JSON/TOML data modules.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLocator;

impl FileLocator {
	pub fn new() -> Self {
		Self
	}

	fn load(path: &Path) -> DiResult<serde_json::Value> {
		let text = std::fs::read_to_string(path)?;
		let parsed = match path.extension().and_then(|ext| ext.to_str()) {
			Some("toml") => toml::from_str::<serde_json::Value>(&text).map_err(|e| e.to_string()),
			_ => serde_json::from_str::<serde_json::Value>(&text).map_err(|e| e.to_string()),
		};
		parsed.map_err(|message| DiError::Load {
			path: path.to_path_buf(),
			message,
		})
	}
}

impl Locator for FileLocator {
	fn locate(&self, name: &str, search_paths: &[PathBuf]) -> DiResult<Option<Located>> {
		for dir in search_paths {
			for extension in MODULE_EXTENSIONS {
				let candidate = dir.join(format!("{name}.{extension}"));
				if !candidate.is_file() {
					continue;
				}
				let canonical = std::fs::canonicalize(&candidate)?;
				let value = Self::load(&canonical)?;
				tracing::debug!(dependency = name, path = %canonical.display(), "data module found");
				return Ok(Some(Located::new(
					Origin::Local,
					LocationKey::file(&canonical),
					Resolved::value(value),
				)));
			}
		}
		Ok(None)
	}

	fn locate_key(&self, key: &LocationKey, _search_paths: &[PathBuf]) -> DiResult<Option<Located>> {
		let Some(path) = key.strip_scheme("file").map(Path::new) else {
			return Ok(None);
		};
		if !path.is_file() {
			return Ok(None);
		}
		let value = Self::load(path)?;
		Ok(Some(Located::new(Origin::Local, key.clone(), Resolved::value(value))))
	}
}
