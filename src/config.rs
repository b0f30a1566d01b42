//! Configuration schema and loading.
//!
//! Settings come from an optional TOML file plus `RONDO__`-prefixed
//! environment overrides; every field has a usable default.

mod load;
mod schema;

pub use schema::*;

#[cfg(test)]
mod tests;
