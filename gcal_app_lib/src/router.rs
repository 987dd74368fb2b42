use log::debug;
use stack_string::{StackString, format_sstr};
use std::io::Write;

use crate::{
    command::{CommandHandler, CommandRegistry, FlagSet, Usage},
    errors::{CommandError, UsageError},
};

const FLAG_PREFIX: char = '-';

/// Picks a verb out of the argument vector and hands the rest to its handler.
#[derive(Debug)]
pub struct CommandRouter {
    registry: CommandRegistry,
    global_flags: Option<fn(&mut FlagSet)>,
}

impl CommandRouter {
    #[must_use]
    pub fn new(registry: CommandRegistry) -> Self {
        Self {
            registry,
            global_flags: None,
        }
    }

    /// Options every verb accepts; registered before the verb is selected.
    #[must_use]
    pub fn with_global_flags(mut self, global_flags: fn(&mut FlagSet)) -> Self {
        self.global_flags = Some(global_flags);
        self
    }

    /// `args` excludes the program name, or the verbs already consumed by
    /// enclosing routers. Errors are returned, not printed; the caller
    /// decides how to report them and which status to exit with.
    pub fn dispatch(
        &self,
        fs: &mut FlagSet,
        args: &[StackString],
        out: &mut dyn Write,
    ) -> Result<(), CommandError> {
        if let Some(global_flags) = self.global_flags {
            global_flags(fs);
        }

        let Some((verb, rest)) = args
            .split_first()
            .filter(|(verb, _)| !verb.starts_with(FLAG_PREFIX))
        else {
            return Err(self.usage_error(fs, "command required but not provided").into());
        };

        let Some(descriptor) = self.registry.get(verb) else {
            return Err(self
                .usage_error(fs, format_sstr!("command provided but not defined: {verb}"))
                .into());
        };

        let full_cmd = format_sstr!("{} {verb}", fs.full_cmd());
        debug!("running {full_cmd} with {rest:?}");
        fs.set_usage(Usage {
            full_cmd,
            entries: vec![(descriptor.syntax.clone(), descriptor.usage.clone())],
        });

        descriptor.handler.run(fs, rest, out)
    }

    /// Usage error listing every registered verb.
    fn usage_error(&self, fs: &mut FlagSet, message: impl std::fmt::Display) -> UsageError {
        let full_cmd = fs.full_cmd().into();
        fs.set_usage(Usage {
            full_cmd,
            entries: self.registry.usage_entries(),
        });
        fs.usage_error(message)
    }
}

/// A router registered as a verb of another router; the command path keeps
/// growing with each level.
impl CommandHandler for CommandRouter {
    fn run(
        &self,
        fs: &mut FlagSet,
        args: &[StackString],
        out: &mut dyn Write,
    ) -> Result<(), CommandError> {
        self.dispatch(fs, args, out)
    }
}
