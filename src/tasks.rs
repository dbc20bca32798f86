//! Mapping task declarations and the batch driver.
//!
//! A mapping task names its source and target inputs, the reconstruction
//! mode of each side, and whether the article-level paragraph mapping
//! artifact should be produced. The driver runs tasks sequentially: a task
//! with missing or empty inputs is skipped with a warning and the run
//! continues; only output-write failures propagate.

use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::loader;
use crate::matcher::Matcher;
use crate::models::{ParagraphStore, TextItem};
use crate::progress::{MatchProgressEvent, MatchProgressReporter as _, ProgressMode};
use crate::reconstruct;
use crate::transform;

/// How one side of a task is reconstructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Unit metadata + paragraph store, range-joined texts.
    Hierarchical,
    /// One text block per id, no paragraph structure.
    Flat,
}

/// One side (source or target) of a mapping task.
#[derive(Debug, Clone)]
pub struct TaskSide {
    pub mode: Mode,
    /// Unit metadata file (hierarchical) or the texts file itself (flat).
    pub meta_file: PathBuf,
    /// Paragraph store file; hierarchical sides only.
    pub paragraphs_file: Option<PathBuf>,
}

impl TaskSide {
    fn hierarchical(meta: PathBuf, paragraphs: PathBuf) -> Self {
        Self {
            mode: Mode::Hierarchical,
            meta_file: meta,
            paragraphs_file: Some(paragraphs),
        }
    }

    fn flat(texts: PathBuf) -> Self {
        Self {
            mode: Mode::Flat,
            meta_file: texts,
            paragraphs_file: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MappingTask {
    pub name: &'static str,
    pub source: TaskSide,
    pub target: TaskSide,
    /// Also write the `{name}_paragraphs.json` Output Mapping artifact.
    pub paragraph_mapping: bool,
}

/// The fixed list of mapping tasks. Source is always the draft, target the
/// current law.
pub fn mapping_tasks(config: &Config) -> Vec<MappingTask> {
    let draft = &config.corpus.draft_dir;
    let law = &config.corpus.law_dir;

    vec![
        MappingTask {
            name: "articles_vs_articles",
            source: TaskSide::hierarchical(draft.join("articles.json"), draft.join("paragraphs.json")),
            target: TaskSide::hierarchical(law.join("articles.json"), law.join("paragraphs.json")),
            paragraph_mapping: true,
        },
        MappingTask {
            name: "provisions_vs_provisions",
            source: TaskSide::hierarchical(
                draft.join("provisions.json"),
                draft.join("paragraphs.json"),
            ),
            target: TaskSide::hierarchical(law.join("provisions.json"), law.join("paragraphs.json")),
            paragraph_mapping: false,
        },
        MappingTask {
            name: "preamble_vs_preamble",
            source: TaskSide::flat(draft.join("preamble.json")),
            target: TaskSide::flat(law.join("preamble.json")),
            paragraph_mapping: false,
        },
    ]
}

/// Print the declared tasks with their modes and input files.
pub fn list_tasks(config: &Config) {
    for task in mapping_tasks(config) {
        println!("{}", task.name);
        println!(
            "  source: {:?} {}",
            task.source.mode,
            task.source.meta_file.display()
        );
        println!(
            "  target: {:?} {}",
            task.target.mode,
            task.target.meta_file.display()
        );
        if task.paragraph_mapping {
            println!("  writes: {0}.json, {0}_paragraphs.json", task.name);
        } else {
            println!("  writes: {}.json", task.name);
        }
    }
}

struct LoadedSide {
    items: Vec<TextItem>,
    store: ParagraphStore,
}

fn load_side(side: &TaskSide) -> LoadedSide {
    match side.mode {
        Mode::Hierarchical => {
            let units = loader::load_units(&side.meta_file);
            let store = side
                .paragraphs_file
                .as_deref()
                .map(loader::load_paragraphs)
                .unwrap_or_default();
            let items = reconstruct::reconstruct_units(&units, &store);
            LoadedSide { items, store }
        }
        Mode::Flat => {
            let entries = loader::load_flat_texts(&side.meta_file);
            LoadedSide {
                items: reconstruct::flat_items(&entries),
                store: ParagraphStore::default(),
            }
        }
    }
}

/// Run all declared tasks, or only the one named by `filter`.
pub async fn run_all(
    config: &Config,
    provider: &dyn EmbeddingProvider,
    filter: Option<&str>,
    progress: ProgressMode,
) -> Result<()> {
    let tasks = mapping_tasks(config);

    if let Some(name) = filter {
        if !tasks.iter().any(|t| t.name == name) {
            anyhow::bail!(
                "Unknown task '{}'. Run `lexalign tasks` to list declared tasks.",
                name
            );
        }
    }

    for task in &tasks {
        if let Some(name) = filter {
            if task.name != name {
                continue;
            }
        }
        run_task(config, provider, task, progress).await?;
    }

    Ok(())
}

/// Execute one mapping task: load, match, write.
pub async fn run_task(
    config: &Config,
    provider: &dyn EmbeddingProvider,
    task: &MappingTask,
    progress: ProgressMode,
) -> Result<()> {
    let reporter = progress.reporter();
    reporter.report(MatchProgressEvent::Loading {
        task: task.name.to_string(),
    });

    let source = load_side(&task.source);
    let target = load_side(&task.target);

    if source.items.is_empty() || target.items.is_empty() {
        eprintln!(
            "Warning: no data for task '{}' (source: {} items, target: {} items), skipping",
            task.name,
            source.items.len(),
            target.items.len()
        );
        return Ok(());
    }

    let matcher = Matcher::new(provider, &config.matching, config.embedding.batch_size)
        .with_progress(progress.reporter(), task.name);

    let output_file = config.corpus.output_dir.join(format!("{}.json", task.name));

    if task.source.mode == Mode::Flat && task.target.mode == Mode::Flat {
        let report = matcher.match_flat(&source.items, &target.items).await;
        loader::save_json(&report, &output_file)?;

        println!("task {}", task.name);
        println!("  sources matched: {}", report.matches.len());
        println!("  written: {}", output_file.display());
        return Ok(());
    }

    let report = matcher
        .match_units(&source.items, &target.items, &source.store, &target.store)
        .await;
    loader::save_json(&report, &output_file)?;

    println!("task {}", task.name);
    println!("  pairs: {}", report.pairs.len());
    println!("  written: {}", output_file.display());

    if task.paragraph_mapping {
        let mapping = transform::to_paragraph_structure(&report);
        let mapping_file = config
            .corpus
            .output_dir
            .join(format!("{}_paragraphs.json", task.name));
        loader::save_json(&mapping, &mapping_file)?;
        println!("  written: {}", mapping_file.display());
    }

    Ok(())
}
