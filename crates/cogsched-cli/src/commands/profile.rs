use std::fs;
use std::path::PathBuf;

use clap::Subcommand;
use cogsched_core::{Profile, ScheduleStore};

use crate::common::{open_service, print_json, CliError};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the stored profile (defaults if none was saved)
    Show,
    /// Replace the profile from a JSON file
    Set {
        /// Path to a JSON profile document
        file: PathBuf,
    },
}

pub fn run(action: ProfileAction) -> Result<(), CliError> {
    let (service, user_id) = open_service()?;
    match action {
        ProfileAction::Show => {
            let profile = service.store().profile(&user_id)?.unwrap_or_default();
            print_json(&profile)?;
        }
        ProfileAction::Set { file } => {
            let raw = fs::read_to_string(&file)?;
            let profile: Profile = serde_json::from_str(&raw)?;
            service.store().save_profile(&user_id, &profile)?;
            print_json(&profile)?;
        }
    }
    Ok(())
}
