//! # Recipe Catalog
//!
//! A recipe service that keeps a local catalog of user-authored recipes and
//! merges it with recipes fetched live from TheMealDB.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────┐
//!   HTTP / CLI ──▶│ SearchAggregator │──┬──▶ LocalCatalog ──▶ RecipeStore (SQLite | memory)
//!                 └──────────────────┘  │
//!                                       └──▶ RecipeProvider (TheMealDB)
//! ```
//!
//! Both branches of a search run concurrently; a failing branch contributes
//! nothing and the request still succeeds.
//!
//! ## Quick Start
//!
//! ```bash
//! recipes init                    # create database
//! recipes search pasta --limit 10
//! recipes get ext_52772
//! recipes serve                   # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite `RecipeStore` |
//! | [`mealdb`] | TheMealDB `RecipeProvider` |
//! | [`services`] | Startup wiring shared by CLI and server |
//! | [`server`] | HTTP API |
//! | [`search`] | `recipes search` |
//! | [`get`] | `recipes get` / `recipes random` |
//! | [`validate`] | `recipes validate` |
//! | [`telemetry`] | Tracing subscriber |
//!
//! Domain types and algorithms live in [`recipe_catalog_core`].

pub mod config;
pub mod db;
pub mod get;
pub mod mealdb;
pub mod migrate;
pub mod search;
pub mod server;
pub mod services;
pub mod sqlite_store;
pub mod telemetry;
pub mod validate;

pub use recipe_catalog_core;
