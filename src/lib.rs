//! # archetl — legacy row to archetype object-graph mapper
//!
//! Converts flat rows exported from a legacy practice-management system
//! into the linked object-creation records a loader needs to build
//! archetype-based domain objects.
//!
//! ## Architecture
//!
//! - **[`mapping`]** — Node path and reference grammars, mapping configuration, and the row mapper
//! - **[`source`]** — CSV and spreadsheet row sources
//! - **[`sink`]** — JSON-lines and CSV output of mapped values
//! - **[`pipeline`]** — Drives input tables through the row mapper into a sink
//! - **[`config`]** — Configuration loading, validation, input pattern expansion, mappings files

pub mod config;
pub mod mapping;
pub mod pipeline;
pub mod sink;
pub mod source;
