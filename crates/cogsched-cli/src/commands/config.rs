use clap::Subcommand;

use crate::common::{load_config, print_json, save_config, CliError};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the full base configuration
    Show,
    /// Update known keys from a JSON object, e.g. '{"quantum_min": 20}'
    Set {
        /// JSON object with the keys to change
        json: String,
    },
    /// Reset the base configuration to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), CliError> {
    match action {
        ConfigAction::Show => {
            print_json(&load_config()?)?;
        }
        ConfigAction::Set { json } => {
            let updates: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(&json)?;
            let mut config = load_config()?;
            // unknown keys reject the whole update, config stays unchanged
            config.apply_updates(&updates)?;
            save_config(&config)?;
            print_json(&config)?;
        }
        ConfigAction::Reset => {
            let config = cogsched_core::CogConfig::default();
            save_config(&config)?;
            println!("configuration reset to defaults");
        }
    }
    Ok(())
}
