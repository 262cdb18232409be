#![doc = include_str!("../README.md")]

mod algorithm;
mod dispatcher;
mod error;
mod shutdown;
mod store;

pub use crate::algorithm::*;
pub use crate::dispatcher::*;
pub use crate::error::*;
pub use crate::shutdown::*;
pub use crate::store::*;
pub use num_bigint;
