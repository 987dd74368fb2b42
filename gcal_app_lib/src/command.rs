use clap::{Arg, ArgAction, ArgMatches, ColorChoice, Command, error::ErrorKind};
use stack_string::{StackString, format_sstr};
use std::{
    collections::{BTreeMap, btree_map::Entry},
    fmt::{self, Write as FmtWrite},
    io::Write,
};

use crate::errors::{CommandError, UsageError};

const POSITIONAL: &str = "__positional";

/// Syntax and usage lines of the commands a usage message should list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
    pub full_cmd: StackString,
    pub entries: Vec<(StackString, StackString)>,
}

/// Option definitions for one invocation plus the usage text that flag
/// errors are reported with.
#[derive(Debug)]
pub struct FlagSet {
    command: Command,
    usage: Usage,
}

impl FlagSet {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            command: Command::new(name.to_string())
                .no_binary_name(true)
                .color(ColorChoice::Never),
            usage: Usage {
                full_cmd: name.into(),
                entries: Vec::new(),
            },
        }
    }

    /// A flag whose id is already registered is left as it is, so nested
    /// routers can share global flags.
    pub fn add_flag(&mut self, arg: Arg) {
        if self
            .command
            .get_arguments()
            .any(|a| a.get_id() == arg.get_id())
        {
            return;
        }
        let command = std::mem::replace(&mut self.command, Command::new(""));
        self.command = command.arg(arg);
    }

    pub fn set_usage(&mut self, usage: Usage) {
        self.usage = usage;
    }

    #[must_use]
    pub fn full_cmd(&self) -> &str {
        &self.usage.full_cmd
    }

    /// Parse flags out of `args`; everything else is returned as positional
    /// arguments in order. Use `--` before positionals starting with `-`.
    pub fn parse(&self, args: &[StackString]) -> Result<ParsedFlags, UsageError> {
        let command = self.command.clone().arg(
            Arg::new(POSITIONAL)
                .num_args(0..)
                .action(ArgAction::Append)
                .hide(true),
        );
        match command.try_get_matches_from(args.iter().map(StackString::as_str)) {
            Ok(matches) => {
                let args = matches
                    .get_many::<String>(POSITIONAL)
                    .map(|values| values.map(|v| v.as_str().into()).collect())
                    .unwrap_or_default();
                Ok(ParsedFlags { matches, args })
            }
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp) => Err(UsageError {
                message: None,
                usage: self.usage(),
            }),
            Err(e) => {
                let rendered = e.to_string();
                let message = rendered
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .trim_start_matches("error: ");
                Err(self.usage_error(message))
            }
        }
    }

    #[must_use]
    pub fn usage_error(&self, message: impl fmt::Display) -> UsageError {
        UsageError {
            message: Some(format_sstr!("{message}")),
            usage: self.usage(),
        }
    }

    /// ```text
    /// usage of gcal list:
    ///   list [<from> [<to>]]
    ///     	list calendar events
    ///
    ///   -c, --calendar <ID>	calendar to read events from
    /// ```
    #[must_use]
    pub fn usage(&self) -> StackString {
        let mut buf = String::new();
        let _ = writeln!(buf, "usage of {}:", self.usage.full_cmd);
        for (syntax, usage) in &self.usage.entries {
            let _ = writeln!(buf, "  {syntax}\n    \t{usage}");
        }
        let defaults = self.flag_defaults();
        if !defaults.is_empty() {
            buf.push('\n');
            buf.push_str(&defaults);
        }
        buf.into()
    }

    fn flag_defaults(&self) -> String {
        let mut buf = String::new();
        for arg in self.command.get_arguments().filter(|a| !a.is_positional()) {
            let mut names = Vec::new();
            if let Some(short) = arg.get_short() {
                names.push(format_sstr!("-{short}"));
            }
            if let Some(long) = arg.get_long() {
                names.push(format_sstr!("--{long}"));
            }
            let _ = write!(buf, "  {}", names.join(", "));
            if let Some(value_names) = arg.get_value_names() {
                for value_name in value_names {
                    let _ = write!(buf, " <{value_name}>");
                }
            }
            if let Some(help) = arg.get_help() {
                let _ = write!(buf, "\t{help}");
            }
            let defaults: Vec<_> = arg
                .get_default_values()
                .iter()
                .map(|v| v.to_string_lossy())
                .collect();
            if !defaults.is_empty() {
                let _ = write!(buf, " (default \"{}\")", defaults.join(","));
            }
            buf.push('\n');
        }
        buf
    }
}

/// Result of a successful flag parse.
#[derive(Debug)]
pub struct ParsedFlags {
    matches: ArgMatches,
    args: Vec<StackString>,
}

impl ParsedFlags {
    #[must_use]
    pub fn args(&self) -> &[StackString] {
        &self.args
    }

    /// Value of a string option, `None` if it was not given or not defined.
    #[must_use]
    pub fn get_one(&self, id: &str) -> Option<&str> {
        self.matches
            .try_get_one::<String>(id)
            .ok()
            .flatten()
            .map(String::as_str)
    }
}

/// A subcommand body. The handler parses its own flags through `fs`, whose
/// usage text has already been scoped to the handler's verb.
pub trait CommandHandler {
    fn run(
        &self,
        fs: &mut FlagSet,
        args: &[StackString],
        out: &mut dyn Write,
    ) -> Result<(), CommandError>;
}

struct FnHandler<F>(F);

impl<F> CommandHandler for FnHandler<F>
where
    F: Fn(&mut FlagSet, &[StackString], &mut dyn Write) -> Result<(), CommandError>,
{
    fn run(
        &self,
        fs: &mut FlagSet,
        args: &[StackString],
        out: &mut dyn Write,
    ) -> Result<(), CommandError> {
        (self.0)(fs, args, out)
    }
}

pub struct CommandDescriptor {
    pub syntax: StackString,
    pub usage: StackString,
    pub handler: Box<dyn CommandHandler>,
}

impl CommandDescriptor {
    pub fn new(syntax: &str, usage: &str, handler: impl CommandHandler + 'static) -> Self {
        Self {
            syntax: syntax.into(),
            usage: usage.into(),
            handler: Box::new(handler),
        }
    }

    pub fn from_fn<F>(syntax: &str, usage: &str, f: F) -> Self
    where
        F: Fn(&mut FlagSet, &[StackString], &mut dyn Write) -> Result<(), CommandError> + 'static,
    {
        Self::new(syntax, usage, FnHandler(f))
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("syntax", &self.syntax)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// Verb to descriptor table, filled before dispatch and read-only after.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<StackString, CommandDescriptor>,
}

impl CommandRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        verb: &str,
        descriptor: CommandDescriptor,
    ) -> Result<Self, CommandError> {
        match self.commands.entry(verb.into()) {
            Entry::Occupied(_) => return Err(CommandError::DuplicateVerb(verb.into())),
            Entry::Vacant(entry) => {
                entry.insert(descriptor);
            }
        }
        Ok(self)
    }

    #[must_use]
    pub fn get(&self, verb: &str) -> Option<&CommandDescriptor> {
        self.commands.get(verb)
    }

    #[must_use]
    pub fn usage_entries(&self) -> Vec<(StackString, StackString)> {
        self.commands
            .values()
            .map(|d| (d.syntax.clone(), d.usage.clone()))
            .collect()
    }
}
