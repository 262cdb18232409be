//! The shared record store.
//!
//! [`SequenceStore`] is the only shared mutable state in the registry. It owns
//! both the id counter and the id-to-record map; every other component treats
//! it as an opaque, internally synchronized handle.

mod record;
mod sequence_store;

pub use record::*;
pub use sequence_store::*;
