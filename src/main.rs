use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::Input;
use doc_qa::Result;
use doc_qa::config::{Config, run_interactive_config, show_config};
use doc_qa::document::Document;
use doc_qa::pipeline::{Pipeline, Response, Session};
use doc_qa::providers::Provider;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "doc-qa")]
#[command(about = "Ask questions about a single document using retrieval-augmented generation")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml (defaults to ~/.doc-qa)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding and generation provider
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Load a document and answer questions about it
    Ask {
        /// PDF or plain text file
        file: PathBuf,
        /// Answer this question and exit instead of prompting
        #[arg(long, short)]
        question: Option<String>,
    },
    /// Check that the configured provider is reachable
    Check,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => Config::default_dir()?,
    };

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config_dir)?;
            } else {
                run_interactive_config(&config_dir)?;
            }
        }
        Commands::Ask { file, question } => {
            ask(&config_dir, &file, question.as_deref())?;
        }
        Commands::Check => {
            let config = Config::load(&config_dir)?;
            Provider::from_config(&config)?.health_check()?;
            eprintln!(
                "{}",
                style(format!("✓ {} provider is reachable", config.provider.kind)).green()
            );
        }
    }

    Ok(())
}

fn ask(config_dir: &Path, file: &Path, question: Option<&str>) -> Result<()> {
    let config = Config::load(config_dir)?;
    // Credentials are checked before the document is read
    let provider = Arc::new(Provider::from_config(&config)?);
    let pipeline = Pipeline::new(config.pipeline_settings(), provider.clone(), provider)?;

    let document = Document::load(file)?;

    let bar = if console::user_attended_stderr() {
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .context("Invalid progress template")?;
        ProgressBar::new_spinner().with_style(style)
    } else {
        ProgressBar::hidden()
    };
    bar.set_message(format!("Indexing {}", file.display()));
    bar.enable_steady_tick(Duration::from_millis(100));
    let session = pipeline.load_document(document.text());
    bar.finish_and_clear();
    let session = session?;

    info!(
        "Indexed {} characters into {} chunks",
        session.document_len(),
        session.chunk_count()
    );

    match question {
        Some(question) => {
            if let Some(response) = session.ask(question) {
                print_response(&response);
            }
        }
        None => question_loop(&session)?,
    }

    Ok(())
}

fn question_loop(session: &Session<'_>) -> Result<()> {
    eprintln!(
        "{}",
        style("Ask a question about the document (empty line to quit)").dim()
    );

    loop {
        let question: String = Input::new()
            .with_prompt("Question")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read question")?;

        match session.ask(&question) {
            Some(response) => print_response(&response),
            None => break,
        }
    }

    Ok(())
}

fn print_response(response: &Response) {
    match response {
        Response::Answer(answer) => println!("{}", answer),
        Response::InsufficientContext => println!("{}", style(response).yellow()),
        Response::Failed(message) => eprintln!("{}", style(format!("✗ {}", message)).red()),
    }
}
