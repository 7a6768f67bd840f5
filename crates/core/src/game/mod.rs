//! Game catalog domain types.
//!
//! A [`Game`] is the locally stored catalog entry. Entries synchronized from
//! the remote catalog carry an `external_id`; entries created by hand do not.

mod rating;
mod types;
mod validate;

pub use rating::classify;
pub use types::*;
pub use validate::{validate_new_game, validate_update};
