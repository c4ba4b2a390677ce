//! # `drover-core`
//!
//! Table model and tag-inheritance gathering for drover, a concurrent
//! telemetry gatherer for fleets of remote agents.
//!
//! A *table* is a named set of fields retrieved from one agent; gathering a
//! table yields rows of tags and decoded values. Every connection is scraped
//! in two phases: an implicit *top-level* pass that collects scalar fields
//! and donates its tags to the connection's tag context, then one pass per
//! configured *real table*, each inheriting the tag keys it asks for.
//!
//! This crate holds the data model ([`table`]), the contracts a protocol
//! layer implements ([`agent`], [`builder`]), and the tagging pass itself
//! ([`gather`]). The worker pool that drives many connections concurrently
//! lives in `drover-pool`.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod agent;
pub mod builder;
pub mod error;
pub mod gather;
pub mod table;
pub mod testing;

pub use agent::AgentConnection;
pub use builder::TableBuilder;
pub use error::{BuildError, BuildResult, GatherError};
pub use gather::{gather_table, AGENT_HOST_TAG};
pub use table::{Field, TableBatch, TableRow, TableSpec, Value};
