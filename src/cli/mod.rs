//! Command-line interface for inspecting and seeding a record store.

pub mod commands;
