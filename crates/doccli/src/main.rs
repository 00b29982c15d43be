use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use doccore::{
    FileStore, IoType, Node, NodeKind, Value, Workflow, WorkflowStore,
};
use docnodes::{LocalFileStore, OpenRouterConfig, PdfiumExtractor, PdfiumRenderer};
use docruntime::{InMemoryWorkflowStore, PipelineExecutor, ProcessorRegistry};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "docflow")]
#[command(about = "Docflow pipeline CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow definition file and print the trace
    Run {
        /// Path to a workflow definition JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Root directory for file references (uploads etc.)
        #[arg(short, long, default_value = "./storage")]
        storage: PathBuf,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check a workflow definition against the domain rules
    Validate {
        /// Path to a workflow definition JSON file
        file: PathBuf,
    },

    /// List available node kinds
    Nodes,
}

fn default_io_type() -> IoType {
    IoType::Text
}

/// Self-contained workflow definition: the workflow plus its pipeline
#[derive(Debug, Deserialize)]
struct WorkflowDefinition {
    name: String,
    #[serde(default = "default_io_type")]
    input_type: IoType,
    #[serde(default = "default_io_type")]
    output_type: IoType,
    #[serde(default)]
    input_data: Option<String>,
    #[serde(default)]
    nodes: Vec<NodeDefinition>,
}

#[derive(Debug, Deserialize)]
struct NodeDefinition {
    node_type: NodeKind,
    #[serde(default)]
    config: HashMap<String, Value>,
}

fn load_definition(path: &PathBuf) -> Result<WorkflowDefinition> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid definition in {}", path.display()))
}

/// Replay the definition's appends through the domain rules
fn validate_definition(definition: &WorkflowDefinition) -> Result<Workflow> {
    let mut workflow = Workflow::new(
        definition.name.clone(),
        definition.input_type,
        definition.output_type,
        definition.input_data.clone(),
    );

    for node_def in &definition.nodes {
        workflow
            .validate_append(node_def.node_type)
            .with_context(|| format!("cannot append {} node", node_def.node_type))?;
        let node = Node::new(workflow.id, node_def.node_type, node_def.config.clone());
        workflow.nodes.push(node);
    }

    Ok(workflow)
}

async fn run_definition(file: PathBuf, storage: PathBuf) -> Result<()> {
    let definition = load_definition(&file)?;
    let workflow = validate_definition(&definition)?;

    if workflow.nodes.is_empty() {
        bail!("workflow has no nodes to run");
    }

    let files: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(storage));
    let mut registry = ProcessorRegistry::new();
    docnodes::register_all(
        &mut registry,
        files,
        Arc::new(PdfiumExtractor),
        OpenRouterConfig::from_env(),
    );

    let store = Arc::new(InMemoryWorkflowStore::new());
    let workflow_id = workflow.id;
    let nodes = workflow.nodes.clone();
    store.save_workflow(workflow).await;
    for node in nodes {
        store.append_node(node).await;
    }

    let executor = PipelineExecutor::new(store, Arc::new(registry), Arc::new(PdfiumRenderer));
    let trace = executor.run(workflow_id).await?;

    println!("{}", serde_json::to_string_pretty(&trace)?);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            storage,
            verbose,
        } => {
            let level = if verbose { "debug" } else { "info" };
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
                )
                .init();

            run_definition(file, storage).await?;
        }

        Commands::Validate { file } => {
            let definition = load_definition(&file)?;
            let workflow = validate_definition(&definition)?;
            println!(
                "OK: {} ({} -> {}, {} nodes)",
                workflow.name,
                workflow.input_type,
                workflow.output_type,
                workflow.nodes.len()
            );
        }

        Commands::Nodes => {
            for kind in [
                NodeKind::ExtractText,
                NodeKind::GenerativeAi,
                NodeKind::Formatter,
            ] {
                println!("{kind}");
            }
        }
    }

    Ok(())
}
