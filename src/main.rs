use std::process::ExitCode;

use gcal_app_lib::gcal_cli::run_cli;

fn main() -> ExitCode {
    env_logger::init();
    run_cli()
}
