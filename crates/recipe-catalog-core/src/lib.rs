//! # Recipe Catalog Core
//!
//! Runtime-agnostic logic for the recipe catalog: data models and
//! validation, instruction splitting, normalization of TheMealDB records,
//! the store and provider abstractions, the local catalog gateway, and the
//! combined search aggregator.
//!
//! This crate contains no sqlx, HTTP client, or filesystem I/O. The server
//! crate supplies a SQLite [`store::RecipeStore`] and an HTTP
//! [`provider::RecipeProvider`].

pub mod catalog;
pub mod instructions;
pub mod models;
pub mod normalize;
pub mod provider;
pub mod search;
pub mod store;
