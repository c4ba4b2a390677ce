//! The tag-inheritance gathering pass.
//!
//! One gather builds one table against one agent, then runs the tagging
//! rules over the result. The per-connection `top_tags` map is the bridge
//! between the two phases of a connection's scrape:
//!
//! * top-level pass (`walk == false`): every row's tags are copied into
//!   `top_tags`, making them available to the tables that follow;
//! * table pass (`walk == true`): each key in the definition's
//!   `inherit_tags` that exists in `top_tags` is stamped onto every row.
//!
//! After either pass, any row still missing an `agent_host` tag gets the
//! connection's host identifier.

use std::collections::HashMap;

use crate::agent::AgentConnection;
use crate::builder::TableBuilder;
use crate::error::BuildResult;
use crate::table::{TableBatch, TableSpec};

/// Tag key every gathered row is guaranteed to carry.
pub const AGENT_HOST_TAG: &str = "agent_host";

/// Builds `spec` against `agent` and applies the tagging rules to every row.
///
/// Rows are processed in the builder's emitted order, so in the top-level
/// pass a later row wins any tag-key collision in `top_tags`. The fallback
/// `agent_host` value is written onto rows only; it never enters `top_tags`,
/// though a top-level row that intrinsically carries `agent_host` donates it
/// like any other tag.
///
/// # Errors
///
/// Returns the builder's failure untouched and leaves `top_tags` unchanged.
/// The caller adds agent and table context when reporting it.
pub async fn gather_table(
    builder: &dyn TableBuilder,
    agent: &dyn AgentConnection,
    spec: &TableSpec,
    top_tags: &mut HashMap<String, String>,
    walk: bool,
) -> BuildResult<TableBatch> {
    let mut batch = builder.build_table(agent, spec, walk).await?;
    apply_tag_rules(&mut batch, spec, top_tags, walk, agent.host());
    Ok(batch)
}

/// The tagging rules, separated from the build so they are testable without
/// a builder.
fn apply_tag_rules(
    batch: &mut TableBatch,
    spec: &TableSpec,
    top_tags: &mut HashMap<String, String>,
    walk: bool,
    host: &str,
) {
    for row in &mut batch.rows {
        if walk {
            for key in &spec.inherit_tags {
                if let Some(value) = top_tags.get(key) {
                    row.tags.insert(key.clone(), value.clone());
                }
            }
        } else {
            for (key, value) in &row.tags {
                top_tags.insert(key.clone(), value.clone());
            }
        }
        if !row.tags.contains_key(AGENT_HOST_TAG) {
            row.tags
                .insert(AGENT_HOST_TAG.to_string(), host.to_string());
        }
    }
}
