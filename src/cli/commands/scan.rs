use anyhow::Result;
use clap::Args;
use ignore::WalkBuilder;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use crate::cli::output::Output;
use crate::config::PoolConfig;
use crate::pool::{DynamicTaskPool, Task};

#[derive(Args)]
pub struct ScanArgs {
    /// Directory to expand
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Stop after this many directories have been listed
    #[arg(long)]
    pub limit: Option<u64>,

    /// Worker threads (overrides configuration)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Descend into ignored and hidden entries as well
    #[arg(long)]
    pub no_ignore: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON format
    Json,
}

/// Arguments for one directory listing task
struct NodeRequest {
    path: PathBuf,
    respect_ignore: bool,
}

/// What a listing task found at its path
enum Node {
    Directory(Vec<PathBuf>),
    File,
}

#[derive(Debug, Default, Serialize)]
struct ScanSummary {
    root: String,
    directories: u64,
    files: u64,
    failures: u64,
    max_depth: usize,
    tasks_submitted: u64,
    tasks_completed: u64,
    truncated: bool,
    elapsed_ms: u128,
}

/// List the immediate children of a directory. Symlinks are reported as
/// files so the expansion never follows a link cycle.
fn scan_node(request: NodeRequest) -> Result<Node> {
    if !fs::symlink_metadata(&request.path)?.is_dir() {
        return Ok(Node::File);
    }

    let mut children = Vec::new();
    let walker = WalkBuilder::new(&request.path)
        .max_depth(Some(1))
        .standard_filters(request.respect_ignore)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for entry in walker {
        let entry = entry?;
        if entry.depth() == 0 {
            continue;
        }
        children.push(entry.into_path());
    }

    Ok(Node::Directory(children))
}

pub fn execute(args: ScanArgs, config: PoolConfig, output: &Output) -> Result<()> {
    let start_time = Instant::now();
    let respect_ignore = !args.no_ignore;
    let config = config.with_workers(args.workers);

    let mut pool: DynamicTaskPool<Node, usize> = DynamicTaskPool::new(config);
    output.verbose(&format!(
        "Scanning {} with {} workers",
        args.path.display(),
        pool.worker_count()
    ));

    pool.add(
        Task::call(
            scan_node,
            NodeRequest {
                path: args.path.clone(),
                respect_ignore,
            },
        )
        .name("root")
        .metadata(0),
    )?;

    let mut summary = ScanSummary {
        root: args.path.display().to_string(),
        ..ScanSummary::default()
    };

    let mut stream = pool.stream()?;
    while let Some(result) = stream.next() {
        let depth = result.metadata.unwrap_or_default();

        match result.outcome {
            Ok(Node::Directory(children)) => {
                summary.directories += 1;
                summary.max_depth = summary.max_depth.max(depth);

                for child in children {
                    let name = child
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| child.display().to_string());
                    stream.add(
                        Task::call(
                            scan_node,
                            NodeRequest {
                                path: child,
                                respect_ignore,
                            },
                        )
                        .name(name)
                        .metadata(depth + 1),
                    );
                }
            }
            Ok(Node::File) => summary.files += 1,
            Err(failure) => {
                summary.failures += 1;
                output.verbose(&format!("Skipping {}: {}", result.name, failure));
            }
        }

        if let Some(limit) = args.limit
            && summary.directories >= limit
        {
            summary.truncated = true;
            break;
        }
    }

    let stats = stream.stats();
    summary.tasks_submitted = stats.tasks_submitted;
    summary.tasks_completed = stats.tasks_completed;
    drop(stream);

    // Anything still queued or running is abandoned here
    pool.shutdown();
    summary.elapsed_ms = start_time.elapsed().as_millis();

    match args.format {
        OutputFormat::Json => output.raw(&serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_summary(&summary, output),
    }

    Ok(())
}

fn print_summary(summary: &ScanSummary, output: &Output) {
    output.header(&format!("Scan of {}", summary.root));
    output.breakdown("directories", summary.directories);
    output.breakdown("files", summary.files);
    if summary.failures > 0 {
        output.breakdown("unreadable entries", summary.failures);
    }
    output.breakdown("levels deep", summary.max_depth as u64);

    if summary.truncated {
        output.warning(&format!(
            "Stopped after {} directories ({} of {} tasks finished)",
            summary.directories, summary.tasks_completed, summary.tasks_submitted
        ));
    } else {
        output.success(&format!(
            "Scan finished: {} tasks in {}ms",
            summary.tasks_completed, summary.elapsed_ms
        ));
    }
}
