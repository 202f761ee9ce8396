//! Annograph CLI
//!
//! Drives the two-phase annotation pipeline:
//! - `build`: entities (JSON) -> similarity-graph snapshot
//! - `propagate`: graph snapshot -> prediction batch (JSON)
//! - `run`: both phases end to end in memory
//! - `stats`: summarize a graph snapshot

use annograph_core::{
    propagate, BuildStats, GraphBuilder, PropagateStats, PropagationConfig, SimilarityGraph,
    DEFAULT_SIMILARITY_THRESHOLD,
};
use annograph_store::persistence::{load_graph, save_graph, JsonEntitySource, JsonPredictionStore};
use annograph_store::{EntitySource, PredictionSink};
use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "annograph")]
#[command(
    author,
    version,
    about = "Similarity-graph construction and label propagation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a similarity graph from a JSON entity file.
    Build {
        /// JSON array of entities (id, features, labels).
        #[arg(long)]
        entities: PathBuf,
        /// Minimum Jaccard similarity; edges require a strictly
        /// greater score.
        #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
        threshold: f64,
        /// Output graph snapshot path.
        #[arg(long)]
        out: PathBuf,
    },

    /// Propagate labels over a previously built graph snapshot.
    Propagate {
        /// Graph snapshot written by `build`.
        #[arg(long)]
        graph: PathBuf,
        #[command(flatten)]
        params: PropagateParams,
        /// Output predictions document.
        #[arg(long)]
        out: PathBuf,
        /// Also write back-annotated entity records here (requires
        /// `--entities`).
        #[arg(long)]
        annotated_out: Option<PathBuf>,
        /// Entity file to project predictions back onto.
        #[arg(long)]
        entities: Option<PathBuf>,
    },

    /// Build and propagate in one pass, without an intermediate
    /// snapshot.
    Run {
        #[arg(long)]
        entities: PathBuf,
        #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
        threshold: f64,
        #[command(flatten)]
        params: PropagateParams,
        #[arg(long)]
        out: PathBuf,
        /// Optionally keep the built graph snapshot.
        #[arg(long)]
        graph_out: Option<PathBuf>,
        /// Optionally write back-annotated entity records.
        #[arg(long)]
        annotated_out: Option<PathBuf>,
    },

    /// Print summary statistics for a graph snapshot.
    Stats {
        #[arg(long)]
        graph: PathBuf,
    },
}

#[derive(Args)]
struct PropagateParams {
    /// Neighbor edges below this weight are excluded from voting.
    #[arg(long, default_value_t = PropagationConfig::default().min_edge_weight)]
    min_edge_weight: f64,
    /// Minimum per-label confidence for assignment.
    #[arg(long, default_value_t = PropagationConfig::default().confidence_threshold)]
    confidence_threshold: f64,
    /// Cap on assigned labels per node.
    #[arg(long, default_value_t = PropagationConfig::default().max_labels_per_node)]
    max_labels_per_node: usize,
}

impl PropagateParams {
    fn to_config(&self) -> PropagationConfig {
        PropagationConfig {
            min_edge_weight: self.min_edge_weight,
            confidence_threshold: self.confidence_threshold,
            max_labels_per_node: self.max_labels_per_node,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Build {
            entities,
            threshold,
            out,
        } => cmd_build(&entities, threshold, &out),
        Commands::Propagate {
            graph,
            params,
            out,
            annotated_out,
            entities,
        } => cmd_propagate(&graph, &params.to_config(), &out, annotated_out, entities),
        Commands::Run {
            entities,
            threshold,
            params,
            out,
            graph_out,
            annotated_out,
        } => cmd_run(
            &entities,
            threshold,
            &params.to_config(),
            &out,
            graph_out,
            annotated_out,
        ),
        Commands::Stats { graph } => cmd_stats(&graph),
    }
}

fn cmd_build(entities_path: &PathBuf, threshold: f64, out: &PathBuf) -> Result<()> {
    let entities = JsonEntitySource::new(entities_path).entities()?;
    let builder = GraphBuilder::new(threshold)?;
    let build = builder.build(&entities);
    print_build_summary(&build.stats, &build.graph);
    save_graph(out, &build.graph)?;
    println!("graph snapshot written to {}", out.display());
    Ok(())
}

fn cmd_propagate(
    graph_path: &PathBuf,
    config: &PropagationConfig,
    out: &PathBuf,
    annotated_out: Option<PathBuf>,
    entities_path: Option<PathBuf>,
) -> Result<()> {
    let mut graph = load_graph(graph_path)?;
    let result = propagate(&mut graph, config)?;
    print_propagate_summary(&result.stats);

    let store = JsonPredictionStore::new(out);
    store.write_predictions(&result.predictions)?;
    println!("predictions written to {}", out.display());

    if let Some(annotated_out) = annotated_out {
        let Some(entities_path) = entities_path else {
            bail!("--annotated-out requires --entities");
        };
        let entities = JsonEntitySource::new(entities_path).entities()?;
        store.write_annotated(&annotated_out, &entities, &result.predictions)?;
        println!("annotated entities written to {}", annotated_out.display());
    }
    Ok(())
}

fn cmd_run(
    entities_path: &PathBuf,
    threshold: f64,
    config: &PropagationConfig,
    out: &PathBuf,
    graph_out: Option<PathBuf>,
    annotated_out: Option<PathBuf>,
) -> Result<()> {
    let entities = JsonEntitySource::new(entities_path).entities()?;
    let builder = GraphBuilder::new(threshold)?;
    let mut build = builder.build(&entities);
    print_build_summary(&build.stats, &build.graph);

    let result = propagate(&mut build.graph, config)?;
    print_propagate_summary(&result.stats);

    let store = JsonPredictionStore::new(out);
    store.write_predictions(&result.predictions)?;
    println!("predictions written to {}", out.display());

    if let Some(graph_out) = graph_out {
        save_graph(&graph_out, &build.graph)?;
        println!("graph snapshot written to {}", graph_out.display());
    }
    if let Some(annotated_out) = annotated_out {
        store.write_annotated(&annotated_out, &entities, &result.predictions)?;
        println!("annotated entities written to {}", annotated_out.display());
    }
    Ok(())
}

fn cmd_stats(graph_path: &PathBuf) -> Result<()> {
    let graph = load_graph(graph_path)?;
    print_graph_summary(&graph);
    Ok(())
}

fn print_build_summary(stats: &BuildStats, graph: &SimilarityGraph) {
    println!("\n{}", "GRAPH CONSTRUCTION".bold());
    println!("  entities seen:        {}", stats.entities_seen);
    println!("  skipped (no features): {}", stats.entities_skipped);
    println!(
        "  nodes created:        {} ({} labeled, {} unlabeled)",
        stats.nodes_created, stats.labeled_nodes, stats.unlabeled_nodes
    );
    println!("  comparisons:          {}", stats.comparisons);
    println!("  edges created:        {}", stats.edges_created);
    println!("  average degree:       {:.2}", graph.average_degree());
}

fn print_propagate_summary(stats: &PropagateStats) {
    println!("\n{}", "LABEL PROPAGATION".bold());
    println!("  candidate nodes:      {}", stats.candidate_nodes);
    println!("  nodes annotated:      {}", stats.nodes_annotated);
    println!("  labels assigned:      {}", stats.labels_assigned);
    println!("  average confidence:   {:.3}", stats.average_confidence);
}

fn print_graph_summary(graph: &SimilarityGraph) {
    println!("\n{}", "GRAPH SNAPSHOT".bold());
    println!("  threshold:            {}", graph.threshold());
    println!("  nodes:                {}", graph.node_count());
    println!("    labeled:            {}", graph.labeled_count());
    println!("    unlabeled:          {}", graph.unlabeled_count());
    println!("  edges:                {}", graph.edge_count());
    println!("  average degree:       {:.2}", graph.average_degree());
    println!("  distinct features:    {}", graph.interner().len());
}
