//! # Marvel Dashboard
//!
//! Fetches characters from the Marvel catalog API, filters them by name and
//! comic count, and summarizes what was fetched.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌─────────────┐   ┌────────────┐
//! │ CatalogClient│──▶│ LoadController │──▶│ derive_view │──▶│ Dashboard  │
//! │  HTTP / file │   │  Mount (watch) │   │ filter+stats│   │ text / JSON│
//! └──────────────┘   └────────────────┘   └─────────────┘   └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! mdash init                          # write ./config/mdash.toml
//! mdash list                          # fetch and show the dashboard
//! mdash list --query spi --mode has-comics
//! mdash stats --json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Character records and response parsing |
//! | [`client`] | Catalog client trait, HTTP and file implementations |
//! | [`controller`] | Single-fetch load cycle with teardown |
//! | [`view`] | Filtering and statistics |
//! | [`dashboard`] | Output snapshot and text rendering |
//! | [`logging`] | `tracing` subscriber setup |

pub mod client;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod logging;
pub mod models;
pub mod view;
