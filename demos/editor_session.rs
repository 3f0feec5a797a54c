use serde_json::json;

use workflow_graph::model::GraphModel;
use workflow_graph::models::{Node, NodeKind};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workflow_graph=debug".into()),
        )
        .init();

    let mut model = GraphModel::default();
    model.subscribe(|nodes, edges| {
        tracing::info!(nodes = nodes.len(), edges = edges.len(), "graph updated");
    });

    // Fill the seed placeholder with an action, then branch on its outcome.
    model.insert_at_placeholder(Node::new("fetch", NodeKind::Action, "Fetch order")?, None);
    model.insert_at_placeholder(
        Node::new("in-stock", NodeKind::Conditional, "In stock?")?,
        Some("replace-fetch"),
    );
    model.insert_at_placeholder(
        Node::new("ship", NodeKind::Action, "Ship order")?,
        Some("replace-in-stock-true"),
    );
    model.patch_node_data("ship", &json!({ "carrier": "dhl" }));

    // A stale double-click: resolves to nothing, changes nothing.
    model.insert_at_placeholder(
        Node::new("dup", NodeKind::Action, "Duplicate")?,
        Some("replace-fetch"),
    );

    println!("{}", serde_json::to_string_pretty(model.nodes())?);
    println!("{}", serde_json::to_string_pretty(model.edges())?);
    Ok(())
}
