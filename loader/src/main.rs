use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use reqwest::Client;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SERVER: &str = "http://127.0.0.1:9999";

#[derive(Parser)]
#[command(name = "loader")]
#[command(about = "Load documents into a running index server and look words up", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a file, or every file under a directory, as one document each
    Load {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Collection to load into
        #[arg(long)]
        index: String,
        /// Base URL of the index server
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
        /// Only load files with this extension, e.g. "txt"
        #[arg(long)]
        extension: Option<String>,
    },
    /// Look up one exact word in a collection
    Search {
        #[arg(long)]
        index: String,
        #[arg(long)]
        q: String,
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Load { input, index, server, extension } => {
            load_documents(&client, &input, &index, &server, extension.as_deref()).await
        }
        Commands::Search { index, q, server } => search(&client, &index, &q, &server).await,
    }
}

async fn load_documents(client: &Client, input: &str, index: &str, server: &str, extension: Option<&str>) -> Result<()> {
    let input_path = Path::new(input);
    let files = collect_files(input_path, extension);
    if files.is_empty() {
        bail!("no documents found under {input}");
    }

    let url = format!("{}/load", server.trim_end_matches('/'));
    let mut loaded = 0usize;
    for file in &files {
        let text = match fs::read_to_string(file) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(file = %file.display(), %err, "skipping unreadable document");
                continue;
            }
        };
        let name = document_name(input_path, file);
        client
            .post(&url)
            .query(&[("index", index), ("name", name.as_str())])
            .body(text)
            .send()
            .await?
            .error_for_status()?;
        tracing::debug!(%name, "loaded");
        loaded += 1;
    }

    tracing::info!(index, loaded, skipped = files.len() - loaded, "load complete");
    Ok(())
}

async fn search(client: &Client, index: &str, q: &str, server: &str) -> Result<()> {
    let url = format!("{}/search", server.trim_end_matches('/'));
    let resp = client.get(&url).query(&[("index", index), ("q", q)]).send().await?;
    let status = resp.status();
    let body: serde_json::Value = serde_json::from_str(&resp.text().await?)?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        bail!("search failed with {status}");
    }
    Ok(())
}

/// Files to load, sorted so runs are repeatable.
fn collect_files(input: &Path, extension: Option<&str>) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && has_extension(p, extension) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() && has_extension(input, extension) {
        files.push(input.to_path_buf());
    }
    files.sort();
    files
}

fn has_extension(path: &Path, extension: Option<&str>) -> bool {
    match extension {
        None => true,
        Some(want) => path.extension().and_then(|s| s.to_str()) == Some(want.trim_start_matches('.')),
    }
}

/// Document name: path relative to the input directory with `/` separators,
/// or the bare file name when a single file was given.
fn document_name(input: &Path, file: &Path) -> String {
    let rel = match file.strip_prefix(input) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel,
        _ => Path::new(file.file_name().unwrap_or(file.as_os_str())),
    };
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
