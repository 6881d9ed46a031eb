//! Shared plumbing for the Aries crates.
//!
//! At the moment this is only the [`observability`] bootstrap used by
//! binaries and integration tests. Library crates never install a
//! subscriber themselves; they only emit `tracing` events.

pub mod observability;
