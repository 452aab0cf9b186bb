use std::path::{Path, PathBuf};

use ::config as config_rs;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Environment-backed config. Nested keys use a double underscore,
/// e.g. `APP_AUTH__JWT_SECRET` or `APP_RATE_LIMIT__READ_REQUESTS`.
pub trait EnvConfig: Sized + DeserializeOwned {
    const PREFIX: &'static str = "APP";
    const SEPARATOR: &'static str = "__";

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// `.env` first, then the process environment. Real variables win over the file.
    fn from_env() -> Result<Self> {
        load_dotenv()?;
        Self::from_source(None)
    }

    /// Reads only the given pairs. Keys keep their prefix.
    fn from_vars<'a>(vars: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let map = vars
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Self::from_source(Some(map))
    }

    fn from_source(vars: Option<config_rs::Map<String, String>>) -> Result<Self> {
        let settings = config_rs::Config::builder()
            .add_source(
                config_rs::Environment::with_prefix(Self::PREFIX)
                    .prefix_separator("_")
                    .separator(Self::SEPARATOR)
                    .try_parsing(true)
                    .source(vars),
            )
            .build()
            .context("failed to read environment variables for config")?;

        let cfg = settings
            .try_deserialize::<Self>()
            .context("failed to deserialize environment into config")?;

        cfg.validate()?;
        Ok(cfg)
    }
}

/// Loads the first `.env` found in the crate root or the working directory.
///
/// Missing files are skipped. A file that exists but fails to parse is an error.
pub fn load_dotenv() -> Result<Option<PathBuf>> {
    let candidates = [
        Path::new(env!("CARGO_MANIFEST_DIR")).join(".env"),
        PathBuf::from(".env"),
    ];
    load_first(&candidates)
}

fn load_first(candidates: &[PathBuf]) -> Result<Option<PathBuf>> {
    for path in candidates {
        match dotenvy::from_path(path) {
            Ok(()) => return Ok(Some(path.clone())),
            Err(err) if err.not_found() => continue,
            Err(err) => {
                return Err(err).with_context(|| format!("failed to load {}", path.display()));
            }
        }
    }
    Ok(None)
}
