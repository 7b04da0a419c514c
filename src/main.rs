//! RepoLens CLI entry point

use anyhow::Context;
use clap::Parser;
use repolens::config::Settings;
use repolens::github::{GitHubClient, Repository, LISTING_WINDOW};
use repolens::RepoService;
use std::process;
use std::sync::Arc;

/// RepoLens - recent repositories for a GitHub user
#[derive(Parser)]
#[command(name = "repolens")]
#[command(version, about, long_about = None)]
struct Cli {
    /// GitHub username to look up
    username: String,

    /// How many repositories to return (defaults to RESULT_LIMIT)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=LISTING_WINDOW as i64))]
    limit: Option<u32>,

    /// Emit the result as pretty-printed JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = repolens::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    if let Err(errors) = settings.validate() {
        let messages: Vec<String> = errors.iter().map(|error| error.to_string()).collect();
        anyhow::bail!("Invalid configuration:\n  - {}", messages.join("\n  - "));
    }

    let client = GitHubClient::new(&settings).context("Failed to build the GitHub client")?;
    let service = RepoService::new(Arc::new(client), &settings);

    let repositories = service
        .list_recent_repositories(&cli.username, cli.limit.map(|limit| limit as usize))
        .await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&repositories)?);
    } else {
        print_table(&cli.username, &repositories);
    }
    Ok(())
}

fn print_table(username: &str, repositories: &[Repository]) {
    if repositories.is_empty() {
        println!("No repositories found for {}", username);
        return;
    }

    println!("Most recent repositories for {}:\n", username);
    for repository in repositories {
        let pushed = repository
            .pushed_at
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "never".to_string());
        let language = repository.primary_language.as_deref().unwrap_or("-");

        println!(
            "  {:<32} pushed {:<10} {:>6} stars  {:>5} forks  {}",
            repository.name, pushed, repository.stargazers_count, repository.forks_count, language
        );
        if !repository.languages.is_empty() {
            let breakdown = repository
                .languages
                .iter()
                .map(|(name, share)| format!("{} {:.1}%", name, share))
                .collect::<Vec<_>>()
                .join(", ");
            println!("    {}", breakdown);
        }
    }
}
