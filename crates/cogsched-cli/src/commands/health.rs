use crate::common::{print_json, CliError};

pub fn run() -> Result<(), CliError> {
    print_json(&cogsched_core::health())
}
