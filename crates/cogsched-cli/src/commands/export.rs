use chrono::Utc;

use crate::common::{open_service, CliError};

pub fn run() -> Result<(), CliError> {
    let (service, user_id) = open_service()?;
    match service.export_calendar(&user_id, Utc::now())? {
        Some(ics) => print!("{ics}"),
        None => return Err("no schedule generated yet, run `cogsched schedule run` first".into()),
    }
    Ok(())
}
