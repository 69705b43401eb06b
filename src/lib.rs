//! Occurrence enrichment with ocean temperature and salinity.
//!
//! Reads occurrence records (longitude, latitude, year, month, day), asks a
//! gridded marine data service for sea water potential temperature and
//! salinity at the nearest available depth, and writes the enriched table.
//!
//! Modules:
//! - `model`: shared row, reading and outcome types.
//! - `input`: occurrence table reader.
//! - `validate`: raw row to typed point.
//! - `ingest`: the provider trait and the ERDDAP griddap client.
//! - `fetch`: depth snapping and the per-point queries.
//! - `pipeline`: per-row outcomes and the single-pass run.
//! - `output`: enriched table writer.
//! - `datasets`, `config`, `logging`, `verify`: supporting pieces.

pub mod config;
pub mod datasets;
pub mod fetch;
pub mod ingest;
pub mod input;
pub mod logging;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod validate;
pub mod verify;
