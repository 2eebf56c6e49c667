#![allow(clippy::too_many_arguments)]
#![warn(unused_assignments)]
#![warn(unused_mut)]
#![warn(unused_imports)]
#![warn(unused_labels)]
#![warn(unused_parens)]
#![warn(unused_variables)]

pub mod chvalid;
pub mod dict;
pub mod entity;
pub mod error;
pub mod parser;

use const_format::concatcp;

/// Version string reported by the library and the lint driver.
pub const VERSION_STRING: &str = concatcp!(
    env!("CARGO_PKG_VERSION_MAJOR"),
    ".",
    env!("CARGO_PKG_VERSION_MINOR"),
    ".",
    env!("CARGO_PKG_VERSION_PATCH")
);
