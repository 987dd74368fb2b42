use anyhow::Error;
use clap::Arg;
use log::error;
use stack_string::StackString;
use std::{
    io::{self, Write},
    process::ExitCode,
};

use gcal_lib::gcal_instance::GCalendarInstance;

use crate::{
    command::{CommandDescriptor, CommandHandler, CommandRegistry, FlagSet},
    config::Config,
    errors::{CommandError, EXIT_FAILURE},
    list_command::{LIST_SYNTAX, LIST_USAGE, ListCommand},
    router::CommandRouter,
};

pub const CALENDAR_FLAG: &str = "calendar";
const PROGRAM_NAME: &str = "gcal";

/// Options accepted by every verb.
pub fn global_flags(fs: &mut FlagSet) {
    fs.add_flag(
        Arg::new(CALENDAR_FLAG)
            .short('c')
            .long(CALENDAR_FLAG)
            .value_name("ID")
            .help("calendar to read events from, overrides CALENDAR_ID"),
    );
}

/// `list` against the real calendar. The config is loaded only once the verb
/// has been selected and its flags parse.
struct ConfiguredList<F> {
    load_config: F,
}

impl<F> CommandHandler for ConfiguredList<F>
where
    F: Fn() -> Result<Config, Error>,
{
    fn run(
        &self,
        fs: &mut FlagSet,
        args: &[StackString],
        out: &mut dyn Write,
    ) -> Result<(), CommandError> {
        fs.parse(args)?;
        let config = (self.load_config)()?;
        let gcal = GCalendarInstance::new(&config.gcal_token_path, &config.gcal_secret_file);
        ListCommand::new(gcal, config).run(fs, args, out)
    }
}

/// Neither the config nor the credentials are read before a verb runs.
pub fn build_router<F>(load_config: F) -> Result<CommandRouter, CommandError>
where
    F: Fn() -> Result<Config, Error> + 'static,
{
    let registry = CommandRegistry::new().register(
        "list",
        CommandDescriptor::new(LIST_SYNTAX, LIST_USAGE, ConfiguredList { load_config }),
    )?;
    Ok(CommandRouter::new(registry).with_global_flags(global_flags))
}

/// Dispatch `args` and report any error; returns the exit status.
pub fn run_router(
    router: &CommandRouter,
    args: &[StackString],
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> u8 {
    let mut fs = FlagSet::new(PROGRAM_NAME);
    match router.dispatch(&mut fs, args, out) {
        Ok(()) => 0,
        Err(e) => {
            if let Err(write_error) = report(&e, out, err) {
                error!("unable to report {e}: {write_error}");
            }
            e.exit_code()
        }
    }
}

fn report(e: &CommandError, out: &mut dyn Write, err: &mut dyn Write) -> Result<(), io::Error> {
    match e {
        CommandError::Usage(usage) if usage.is_help() => write!(out, "{}", usage.usage),
        CommandError::Usage(usage) => {
            writeln!(err, "{usage}")?;
            write!(err, "{}", usage.usage)
        }
        CommandError::Date(_) => writeln!(err, "{e}"),
        _ => {
            error!("{e:?}");
            writeln!(err, "{e}")
        }
    }
}

/// Entry point of the `gcal` binary.
#[must_use]
pub fn run_cli() -> ExitCode {
    let args: Vec<StackString> = std::env::args().skip(1).map(Into::into).collect();
    let router = match build_router(Config::init_config) {
        Ok(router) => router,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    let stdout = io::stdout();
    let stderr = io::stderr();
    ExitCode::from(run_router(
        &router,
        &args,
        &mut stdout.lock(),
        &mut stderr.lock(),
    ))
}
