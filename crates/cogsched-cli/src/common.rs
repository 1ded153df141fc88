//! Shared CLI plumbing: data directory, base config file, service setup.

use std::fs;
use std::path::PathBuf;

use cogsched_core::{CogConfig, RegexTaskParser, Service, Storage};

pub type CliError = Box<dyn std::error::Error>;

/// `~/.config/cogsched`, created on first use.
pub fn data_dir() -> Result<PathBuf, CliError> {
    let base = std::env::var_os("COGSCHED_DATA_DIR")
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config/cogsched"))
        })
        .ok_or("cannot determine data directory: neither COGSCHED_DATA_DIR nor HOME is set")?;
    fs::create_dir_all(&base)?;
    Ok(base)
}

fn config_path() -> Result<PathBuf, CliError> {
    Ok(data_dir()?.join("config.toml"))
}

/// Load the base config, falling back to defaults when no file exists.
pub fn load_config() -> Result<CogConfig, CliError> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(CogConfig::default());
    }
    let raw = fs::read_to_string(&path)?;
    Ok(toml::from_str(&raw)?)
}

pub fn save_config(config: &CogConfig) -> Result<(), CliError> {
    let path = config_path()?;
    fs::write(&path, toml::to_string_pretty(config)?)?;
    Ok(())
}

/// Open the service over the on-disk store and the regex fallback parser,
/// returning the local user's id alongside it.
pub fn open_service() -> Result<(Service<Storage, RegexTaskParser>, String), CliError> {
    let storage = Storage::open(&data_dir()?.join("cogsched.db"))?;
    let user = storage.upsert_user("local", "", "Local User", "")?;
    let service = Service::new(load_config()?, storage, RegexTaskParser::new());
    Ok((service, user.id))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
