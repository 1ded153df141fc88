use clap::Args;
use cogsched_core::{EngineOptions, ProfileOverrides};

use crate::common::{open_service, print_json, CliError};

#[derive(Args)]
pub struct ChatArgs {
    /// What you want to get done today, in plain language
    pub message: String,
    #[arg(long)]
    pub sleep_hours: Option<f64>,
    #[arg(long)]
    pub stress: Option<u8>,
    #[arg(long)]
    pub from: Option<String>,
    #[arg(long)]
    pub to: Option<String>,
    /// Fixed break windows, e.g. 13:00-14:00 (repeatable)
    #[arg(long = "break")]
    pub breaks: Vec<String>,
}

pub fn run(args: ChatArgs) -> Result<(), CliError> {
    let (service, user_id) = open_service()?;
    let overrides = ProfileOverrides {
        sleep_hours: args.sleep_hours,
        stress_level: args.stress,
        chronotype: None,
        lectures_today: None,
        available_from: args.from,
        available_to: args.to,
        breaks_at: if args.breaks.is_empty() {
            None
        } else {
            Some(args.breaks)
        },
    };
    let plan = service.converse(
        &user_id,
        &args.message,
        &overrides,
        &EngineOptions::for_today(),
    )?;
    print_json(&plan)?;
    Ok(())
}
