use chrono::Utc;
use clap::Args;

use crate::common::{open_service, print_json, CliError};

#[derive(Args)]
pub struct TlxArgs {
    /// Index of the completed block in the last plan
    #[arg(long)]
    pub block: i64,
    /// Mental demand, 1-7
    #[arg(long)]
    pub mental: u8,
    /// Effort, 1-7
    #[arg(long)]
    pub effort: u8,
}

pub fn run(args: TlxArgs) -> Result<(), CliError> {
    let (service, user_id) = open_service()?;
    let response =
        service.tlx_feedback(&user_id, args.block, args.mental, args.effort, Utc::now())?;
    print_json(&response)?;
    Ok(())
}
