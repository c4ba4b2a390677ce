//! Scrapes a small mock fleet and prints what came back.
//!
//! The builder answers from scripts instead of the network; swap in a real
//! protocol implementation to scrape actual agents.
//!
//! Run with: `cargo run --example poll_fleet -p drover-pool`

use std::sync::Arc;

use drover_core::testing::{value_row, MockAgent, MockBuilder};
use drover_core::{AgentConnection, Field, TableSpec, Value};
use drover_pool::{gather_all, GatherOutcome, GatherPlan, PoolConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let builder = Arc::new(
        MockBuilder::new()
            .with_rows(
                "device",
                vec![value_row(
                    &[("region", "us-east"), ("model", "mx480")],
                    &[("uptime", Value::Unsigned(86_400))],
                )],
            )
            .with_rows(
                "interfaces",
                vec![
                    value_row(
                        &[("ifDescr", "eth0")],
                        &[("ifInOctets", Value::Unsigned(1_234_567))],
                    ),
                    value_row(
                        &[("ifDescr", "eth1")],
                        &[("ifInOctets", Value::Unsigned(89_012))],
                    ),
                ],
            )
            .with_host_failure("10.0.0.3", "interfaces", "request timed out"),
    );

    let mut interfaces = TableSpec::new("interfaces");
    interfaces.fields = vec![
        Field::tag("ifDescr", "1.3.6.1.2.1.2.2.1.2"),
        Field::new("ifInOctets", "1.3.6.1.2.1.2.2.1.10"),
    ];
    interfaces.inherit_tags = vec!["region".to_string()];

    let mut plan = GatherPlan::new("device");
    plan.scalar_fields = vec![Field::new("uptime", "1.3.6.1.2.1.1.3.0")];
    plan.tables = vec![interfaces];

    let agents: Vec<Arc<dyn AgentConnection>> = (1..=5)
        .map(|i| Arc::new(MockAgent::new(format!("10.0.0.{i}"))) as Arc<dyn AgentConnection>)
        .collect();

    let config = PoolConfig {
        workers: 2,
        ..PoolConfig::default()
    };
    let outcomes = gather_all(builder, plan, &config, agents).await;

    let mut rows = 0;
    let mut failures = 0;
    for outcome in &outcomes {
        match outcome {
            GatherOutcome::Table(batch) => {
                rows += batch.row_count();
                for row in &batch.rows {
                    let mut tags: Vec<String> =
                        row.tags.iter().map(|(k, v)| format!("{k}={v}")).collect();
                    tags.sort();
                    println!("{:<12} [{}]", batch.name, tags.join(" "));
                }
            }
            GatherOutcome::Failed(err) => {
                failures += 1;
                println!("error: {err}");
            }
        }
    }
    println!(
        "{} outcomes, {rows} rows, {failures} failures",
        outcomes.len()
    );
}
