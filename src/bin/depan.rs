//! depan CLI - inspect and collapse dependency graph snapshots.
//!
//! Usage:
//!   depan stats <graph.json>                       # Node/edge statistics
//!   depan hierarchy <graph.json> --depth 3         # Spanning forest
//!   depan collapse <graph.json> --uncollapse src   # Exposed view after collapsing

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use depan::{
    compute_spanning_hierarchy, Collapser, DepanConfig, GraphModel, GraphSnapshot,
    RelationRegistry, SpanningForest, TreeModel,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "depan")]
#[command(about = "depan - dependency graph exploration", long_about = None)]
struct Cli {
    /// Config file (default: .depan/config.toml under the current directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show graph statistics
    Stats {
        /// Graph snapshot (JSON)
        snapshot: PathBuf,
    },

    /// Print the spanning forest of the configured hierarchy
    Hierarchy {
        /// Graph snapshot (JSON)
        snapshot: PathBuf,

        /// How many levels to print
        #[arg(short, long, default_value = "3")]
        depth: usize,
    },

    /// Collapse the hierarchy and report what remains exposed
    Collapse {
        /// Graph snapshot (JSON)
        snapshot: PathBuf,

        /// Masters to uncollapse afterwards, one level each, in order
        #[arg(short, long)]
        uncollapse: Vec<String>,
    },
}

fn main() {
    // Logs go to stderr; stdout carries the command output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .unwrap_or_else(|| DepanConfig::default_path(Path::new(".")));
    let config = DepanConfig::load(&config_path);
    let mut registry = config.build_registry()?;

    match cli.command {
        Commands::Stats { snapshot } => {
            let graph = load_graph(&snapshot, &mut registry)?;
            let stats = graph.stats();
            let by_relation: Vec<(String, usize)> = stats
                .relation_counts
                .iter()
                .map(|(id, count)| {
                    let key = registry
                        .get(*id)
                        .map(|r| r.key().to_string())
                        .unwrap_or_else(|| id.to_string());
                    (key, *count)
                })
                .collect();
            let json = serde_json::json!({
                "nodes": stats.node_count,
                "edges": stats.edge_count,
                "relations": by_relation,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }

        Commands::Hierarchy { snapshot, depth } => {
            let graph = load_graph(&snapshot, &mut registry)?;
            let matcher = config.hierarchy_matcher(&registry)?;
            let tree = TreeModel::Hierarchical(compute_spanning_hierarchy(&graph, &matcher));
            let forest = tree.spanning_forest(&graph);
            for root in forest.roots() {
                print_tree(&forest, root.id(), root.label(), 0, depth);
            }
        }

        Commands::Collapse {
            snapshot,
            uncollapse,
        } => {
            let graph = load_graph(&snapshot, &mut registry)?;
            let matcher = config.hierarchy_matcher(&registry)?;
            let tree = TreeModel::Hierarchical(compute_spanning_hierarchy(&graph, &matcher));

            let mut collapser = Collapser::new();
            collapser.collapse_tree(&graph, &tree)?;
            for master in &uncollapse {
                collapser
                    .uncollapse(master)
                    .with_context(|| format!("cannot uncollapse '{}'", master))?;
            }

            let exposed = collapser.build_exposed_graph(&graph)?;
            println!("Exposed graph");
            println!("═════════════");
            println!("Nodes:  {} (of {})", exposed.node_count(), graph.node_count());
            println!("Edges:  {} (of {})", exposed.edge_count(), graph.edge_count());
            println!("Groups: {}", collapser.group_count());
            println!();
            for node in exposed.nodes().take(20) {
                let marker = if collapser.is_master(node.id()) { "+" } else { " " };
                println!("  {} {} ({})", marker, node.label(), node.kind());
            }
            if exposed.node_count() > 20 {
                println!("  ... and {} more", exposed.node_count() - 20);
            }
        }
    }

    Ok(())
}

fn load_graph(path: &Path, registry: &mut RelationRegistry) -> Result<GraphModel> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let snapshot = GraphSnapshot::from_json(&text)?;
    let graph = snapshot.restore(registry)?;
    info!(
        snapshot = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "loaded graph"
    );
    Ok(graph)
}

fn print_tree(forest: &SpanningForest, id: &str, label: &str, level: usize, max_depth: usize) {
    println!("{}{}", "  ".repeat(level), label);
    if level + 1 >= max_depth {
        let hidden = forest.children(id).len();
        if hidden > 0 {
            println!("{}... {} more", "  ".repeat(level + 1), hidden);
        }
        return;
    }
    for child in forest.children(id) {
        print_tree(forest, child.id(), child.label(), level + 1, max_depth);
    }
}
