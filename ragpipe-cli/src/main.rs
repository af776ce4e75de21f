//! `ragpipe`: serve, query and evaluate the RAG pipeline.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use ragpipe_cli::{AppConfig, StoreBackend, build_state};
use ragpipe_server::run_server;
use ragpipe_telemetry::init_telemetry;

#[derive(Parser, Debug)]
#[command(name = "ragpipe", version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./config.yaml when present)
    #[arg(short, long, env = "RAGPIPE_CONFIG")]
    config: Option<PathBuf>,

    /// Keep vectors in process memory instead of Qdrant
    #[arg(long)]
    memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Chunk, embed and store a plain-text document
    Ingest {
        /// UTF-8 text file
        file: PathBuf,
    },
    /// Answer a question from retrieved context
    Ask { question: String },
    /// Answer a question without retrieval
    AskDirect { question: String },
    /// Score the pipeline against the configured datasets and print JSON
    Eval {
        #[arg(value_enum)]
        kind: EvalKind,
    },
    /// Delete the API collection
    Reset {
        /// Delete the evaluation collection instead
        #[arg(long)]
        evaluation: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EvalKind {
    Retrieval,
    Generation,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    init_telemetry(&config.telemetry)?;

    let backend = if cli.memory { StoreBackend::Memory } else { StoreBackend::Qdrant };
    let state = build_state(&config, backend)?;

    match cli.command {
        Command::Serve => run_server(config.server_config(), state).await?,
        Command::Ingest { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let report = state.pipeline.ingest(&text).await?;
            println!("stored {} chunks in '{}'", report.chunk_count, report.collection);
        }
        Command::Ask { question } => {
            let answer = state.pipeline.answer(&question).await?;
            println!("{}", answer.text);
            for (i, context) in answer.contexts.iter().enumerate() {
                eprintln!("[chunk {}] {context}", i + 1);
            }
        }
        Command::AskDirect { question } => {
            println!("{}", state.pipeline.answer_direct(&question).await?);
        }
        Command::Eval { kind: EvalKind::Retrieval } => {
            let result = state.evaluator.retrieval_report().await?;
            println!("{}", serde_json::to_string_pretty(result.as_ref())?);
        }
        Command::Eval { kind: EvalKind::Generation } => {
            let result = state.evaluator.generation_report().await?;
            println!("{}", serde_json::to_string_pretty(result.as_ref())?);
        }
        Command::Reset { evaluation } => {
            let pipeline =
                if evaluation { state.evaluator.pipeline().clone() } else { state.pipeline.clone() };
            pipeline.reset().await?;
            println!("deleted collection '{}'", pipeline.collection());
        }
    }

    Ok(())
}
