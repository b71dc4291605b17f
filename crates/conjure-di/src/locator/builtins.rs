//! Default built-in facilities
//!
//! | name       | type                        |
//! |------------|-----------------------------|
//! | `env`      | `BTreeMap<String, String>`  |
//! | `argv`     | `Vec<String>`               |
//! | `cwd`      | `PathBuf` (when available)  |
//! | `tempDir`  | `PathBuf`                   |
//! | `platform` | `Platform`                  |
//!
//! Values are captured when [`install`] runs.

use super::Catalog;
use crate::value::Resolved;
use std::collections::BTreeMap;

/// Host platform description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
	pub os: &'static str,
	pub arch: &'static str,
	pub family: &'static str,
}

impl Platform {
	pub fn current() -> Self {
		Self {
			os: std::env::consts::OS,
			arch: std::env::consts::ARCH,
			family: std::env::consts::FAMILY,
		}
	}
}

/// Adds the default built-ins to `catalog`.
pub fn install(catalog: &Catalog) {
	let env: BTreeMap<String, String> = std::env::vars().collect();
	catalog.add_builtin("env", Resolved::value(env));
	catalog.add_builtin("argv", Resolved::value(std::env::args().collect::<Vec<_>>()));
	match std::env::current_dir() {
		Ok(cwd) => catalog.add_builtin("cwd", Resolved::value(cwd)),
		Err(error) => tracing::debug!(%error, "current directory unavailable; `cwd` not installed"),
	}
	catalog.add_builtin("tempDir", Resolved::value(std::env::temp_dir()));
	catalog.add_builtin("platform", Resolved::value(Platform::current()));
}
