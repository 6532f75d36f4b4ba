//! Small utilities shared by the disaggregation library and its command-line driver: logging
//! setup, counting, phase timing, and JSON config loading.

#[macro_use]
extern crate log;

mod collections;
mod io;
pub mod logger;
mod time;
mod utils;

pub use crate::collections::Counter;
pub use crate::io::read_json;
pub use crate::time::{elapsed_seconds, prettyprint_time, Timer};
pub use crate::utils::{plain_list_names, prettyprint_usize};
