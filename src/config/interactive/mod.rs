#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::path::Path;

use super::{Config, ConfigError, ProviderConfig, ProviderKind};
use crate::providers::Provider;

#[inline]
pub fn run_interactive_config(config_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🔧 doc-qa Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(config_dir)?;

    eprintln!("{}", style("Provider Configuration").bold().yellow());
    eprintln!("Choose the service used for embeddings and answer generation.");
    eprintln!();

    configure_provider(&mut config.provider)?;

    eprintln!();
    eprintln!("{}", style("Retrieval Configuration").bold().yellow());
    eprintln!();

    configure_retrieval(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    match test_provider_connection(&config) {
        Ok(()) => eprintln!("{}", style("✓ Provider connection successful!").green()),
        Err(e) => {
            eprintln!(
                "{}",
                style(format!("⚠ Warning: provider check failed: {}", e)).yellow()
            );
            eprintln!("You can continue, but questions will fail until this is fixed.");
        }
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Provider Settings:").bold().yellow());
    eprintln!("  Kind: {}", style(config.provider.kind).cyan());
    match config.provider.base_url() {
        Ok(url) => eprintln!("  Base URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  Base URL: {} ({})", style("Invalid").red(), e),
    }
    eprintln!(
        "  Embedding Model: {}",
        style(config.provider.embedding_model()).cyan()
    );
    eprintln!(
        "  Generation Model: {}",
        style(config.provider.generation_model()).cyan()
    );
    eprintln!("  API Key: {}", credential_status(&config));

    eprintln!();
    eprintln!("{}", style("Pipeline Settings:").bold().yellow());
    eprintln!(
        "  Chunk Size: {} (overlap {})",
        style(config.chunking.max_size).cyan(),
        style(config.chunking.overlap).cyan()
    );
    eprintln!("  Top K: {}", style(config.retrieval.top_k).cyan());
    eprintln!("  Metric: {}", style(config.retrieval.metric).cyan());
    eprintln!(
        "  Max Output Tokens: {}",
        style(config.generation.max_output_tokens).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

/// Describe whether the API key is available, without revealing it
fn credential_status(config: &Config) -> String {
    let var = config.provider.api_key_env();
    match config.credentials() {
        Ok(Some(_)) => format!("set (from {})", var),
        Ok(None) => format!("not set ({} is optional for {})", var, config.provider.kind),
        Err(_) => format!("missing ({} is not set)", var),
    }
}

fn load_existing_config(config_dir: &Path) -> Result<Config> {
    Config::load(config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                base_dir: config_dir.to_path_buf(),
                ..Config::default()
            })
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_provider(provider: &mut ProviderConfig) -> Result<()> {
    let kinds = [ProviderKind::OpenAi, ProviderKind::Ollama];
    let default_index = kinds
        .iter()
        .position(|&k| k == provider.kind)
        .unwrap_or(0);

    let kind_index = Select::new()
        .with_prompt("Provider")
        .default(default_index)
        .items(&kinds)
        .interact()?;

    let kind = kinds[kind_index];
    if kind != provider.kind {
        *provider = ProviderConfig::for_kind(kind);
    }

    let base_url: String = Input::new()
        .with_prompt("API base URL")
        .default(provider.base_url()?.to_string())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = ProviderConfig {
                base_url: Some(input.clone()),
                ..ProviderConfig::for_kind(kind)
            };
            temp_config.base_url()?;
            Ok(())
        })
        .interact_text()?;

    let embedding_model: String = Input::new()
        .with_prompt("Embedding model")
        .default(provider.embedding_model().to_string())
        .validate_with(non_empty)
        .interact_text()?;

    let generation_model: String = Input::new()
        .with_prompt("Generation model")
        .default(provider.generation_model().to_string())
        .validate_with(non_empty)
        .interact_text()?;

    let api_key_env: String = Input::new()
        .with_prompt("Environment variable holding the API key")
        .default(provider.api_key_env().to_string())
        .validate_with(non_empty)
        .interact_text()?;

    provider.set_base_url(base_url)?;
    provider.set_embedding_model(embedding_model)?;
    provider.set_generation_model(generation_model)?;
    provider.api_key_env = Some(api_key_env);

    Ok(())
}

fn configure_retrieval(config: &mut Config) -> Result<()> {
    let max_size: usize = Input::new()
        .with_prompt("Maximum chunk size (characters)")
        .default(config.chunking.max_size)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if *input == 0 {
                Err("Chunk size must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let overlap: usize = Input::new()
        .with_prompt("Chunk overlap (characters)")
        .default(config.chunking.overlap.min(max_size - 1))
        .validate_with(|input: &usize| -> Result<(), &str> {
            if *input >= max_size {
                Err("Overlap must be smaller than the chunk size")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let top_k: usize = Input::new()
        .with_prompt("Chunks retrieved per question")
        .default(config.retrieval.top_k)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=100).contains(input) {
                Ok(())
            } else {
                Err("Top K must be between 1 and 100")
            }
        })
        .interact_text()?;

    config.chunking.max_size = max_size;
    config.chunking.overlap = overlap;
    config.retrieval.top_k = top_k;
    config.validate()?;

    Ok(())
}

fn non_empty(input: &String) -> Result<(), &'static str> {
    if input.trim().is_empty() {
        Err("Value cannot be empty")
    } else {
        Ok(())
    }
}

fn test_provider_connection(config: &Config) -> crate::Result<()> {
    Provider::from_config(config)?.health_check()
}
