//! Data models for the notes application.
//!
//! Persisted shapes match the JSON stored under the `Notes` and `Tags` slots.

mod note;
mod tag;

pub use note::*;
pub use tag::*;
