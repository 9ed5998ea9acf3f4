mod report;

use crate::analysis::{format_bytes, Metrics};
use crate::error::Result;
use crate::render::RenderConfig;
use crate::resume::{load_resume_file, ResumeRecord};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::task::JoinSet;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "resume-inspect")]
#[command(about = "Inspect libtorrent .fastresume files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single resume file
    Show {
        /// Path to the .fastresume file
        file: PathBuf,

        /// Print the record and metrics as JSON
        #[arg(long)]
        json: bool,

        /// Skip the listing of every raw field
        #[arg(long)]
        no_fields: bool,

        /// Lists up to this many items are expanded
        #[arg(long)]
        list_limit: Option<usize>,

        /// Byte strings up to this many bytes are shown in full hex
        #[arg(long)]
        hex_max: Option<usize>,

        /// Bitfields up to this many pieces are drawn as a map
        #[arg(long)]
        map_max: Option<usize>,
    },

    /// List resume files in a directory
    Scan {
        /// Directory holding resume files
        dir: PathBuf,

        /// File extension to look for
        #[arg(short, long, default_value = "fastresume")]
        extension: String,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct ShowReport<'a> {
    record: &'a ResumeRecord,
    metrics: &'a Metrics,
}

/// One file found by `scan`
#[derive(Debug, Serialize)]
struct ScanEntry {
    path: PathBuf,
    size: u64,
    name: Option<String>,
    anomalies: usize,
    error: Option<String>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Show {
                file,
                json,
                no_fields,
                list_limit,
                hex_max,
                map_max,
            } => {
                let defaults = RenderConfig::default();
                let config = RenderConfig {
                    list_expand_max: list_limit.unwrap_or(defaults.list_expand_max),
                    hex_full_max: hex_max.unwrap_or(defaults.hex_full_max),
                    piece_map_max: map_max.unwrap_or(defaults.piece_map_max),
                    ..defaults
                };
                self.show(file, *json, !*no_fields, &config).await?;
            }

            Commands::Scan {
                dir,
                extension,
                json,
            } => {
                self.scan(dir, extension, *json).await?;
            }
        }

        Ok(())
    }

    async fn show(
        &self,
        path: &Path,
        json: bool,
        all_fields: bool,
        config: &RenderConfig,
    ) -> Result<()> {
        let size = fs::metadata(path).await?.len();
        let resume = load_resume_file(path).await?;
        let metrics = Metrics::from_record(&resume.record);
        info!(
            "Decoded {} ({} anomalies)",
            path.display(),
            resume.record.anomalies.len()
        );

        if json {
            let report = ShowReport {
                record: &resume.record,
                metrics: &metrics,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        let mut out = std::io::stdout().lock();
        writeln!(out, "File: {}", path.display())?;
        writeln!(out, "Size: {}", format_bytes(size as i64))?;
        report::write_report(&mut out, &resume, &metrics, config, all_fields)?;

        Ok(())
    }

    async fn scan(&self, dir: &Path, extension: &str, json: bool) -> Result<()> {
        let files = find_resume_files(dir, extension).await?;
        info!("Found {} resume files in {}", files.len(), dir.display());

        // Files are independent, so decode them concurrently
        let mut tasks = JoinSet::new();
        for (index, path) in files.iter().cloned().enumerate() {
            tasks.spawn(async move { (index, inspect(path).await) });
        }

        let mut entries: Vec<Option<ScanEntry>> = files.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, entry)) => entries[index] = Some(entry),
                Err(err) => warn!("Scan task failed: {}", err),
            }
        }
        let entries: Vec<ScanEntry> = entries.into_iter().flatten().collect();

        if json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }

        if entries.is_empty() {
            println!("No .{} files found in {}", extension, dir.display());
            return Ok(());
        }

        println!("Found {} resume files:\n", entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let file_name = entry
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!(
                "  [{:3}] {} ({})",
                i + 1,
                file_name,
                format_bytes(entry.size as i64)
            );
            match (&entry.name, &entry.error) {
                (_, Some(error)) => println!("        parse failed: {}", error),
                (Some(name), None) => println!("        name: {}", name),
                (None, None) => {}
            }
            if entry.anomalies > 0 {
                println!("        warnings: {}", entry.anomalies);
            }
        }

        Ok(())
    }
}

/// Files in `dir` with the given extension, sorted by path
async fn find_resume_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut reader = fs::read_dir(dir).await?;

    while let Some(entry) = reader.next_entry().await? {
        let path = entry.path();
        let matches = path.extension().is_some_and(|ext| ext == extension);
        if matches && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

async fn inspect(path: PathBuf) -> ScanEntry {
    let size = fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);

    match load_resume_file(&path).await {
        Ok(resume) => ScanEntry {
            name: Some(resume.record.name).filter(|n| !n.is_empty()),
            anomalies: resume.record.anomalies.len(),
            error: None,
            path,
            size,
        },
        Err(err) => {
            warn!("Failed to parse {}: {}", path.display(), err);
            ScanEntry {
                name: None,
                anomalies: 0,
                error: Some(err.to_string()),
                path,
                size,
            }
        }
    }
}
