#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::similar_names)]

pub mod calendar;
pub mod command;
pub mod config;
pub mod date_expression;
pub mod date_range;
pub mod errors;
pub mod gcal_cli;
pub mod list_command;
pub mod render;
pub mod router;
pub mod timezone;
