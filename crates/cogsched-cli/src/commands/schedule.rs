use std::fs;
use std::path::PathBuf;

use clap::Subcommand;
use cogsched_core::{EngineOptions, ScheduleRequest, ScheduleStore, Task};

use crate::common::{open_service, print_json, CliError};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Run the engine on a JSON array of tasks
    Run {
        /// Path to a JSON file with the task list
        #[arg(long)]
        tasks: PathBuf,
        /// Window start HH:MM (defaults to the profile's wake time)
        #[arg(long)]
        from: Option<String>,
        /// Window end HH:MM (defaults to the profile's sleep time)
        #[arg(long)]
        to: Option<String>,
    },
    /// Show the most recently produced plan
    Last,
}

pub fn run(action: ScheduleAction) -> Result<(), CliError> {
    let (service, user_id) = open_service()?;
    match action {
        ScheduleAction::Run { tasks, from, to } => {
            let raw = fs::read_to_string(&tasks)?;
            let tasks: Vec<Task> = serde_json::from_str(&raw)?;
            let profile = service.store().profile(&user_id)?.unwrap_or_default();
            let req = ScheduleRequest {
                tasks,
                profile,
                available_from: from,
                available_to: to,
            };
            let plan = service.schedule(&user_id, &req, &EngineOptions::for_today())?;
            print_json(&plan)?;
        }
        ScheduleAction::Last => match service.store().latest_plan(&user_id)? {
            Some(stored) => print_json(&stored.data)?,
            None => println!("no schedule generated yet"),
        },
    }
    Ok(())
}
