#![allow(clippy::must_use_candidate)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::missing_errors_doc)]

pub mod datetimetype;
pub mod gcal_instance;

use anyhow::{Error, format_err};
use log::error;
use retry::{
    delay::{Exponential, jitter},
    retry,
};

pub fn exponential_retry<T, U>(closure: T) -> Result<U, Error>
where
    T: Fn() -> Result<U, Error>,
{
    retry(
        Exponential::from_millis(2)
            .map(jitter)
            .map(|x| x * 500)
            .take(6),
        || {
            closure().map_err(|e| {
                error!("Got error {e:?} , retrying");
                e
            })
        },
    )
    .map_err(|e| format_err!("{:?}", e.error))
}
