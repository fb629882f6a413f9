//! Implementations of the catalogue operations.
//!
//! Each function takes ownership of the table and returns the transformed
//! table. Column checks happen before any row is read, so running an
//! operation on a table with no rows validates it against the columns alone.

pub(crate) mod columns;
pub(crate) mod dates;
pub(crate) mod group;
pub(crate) mod rows;
pub(crate) mod text;
