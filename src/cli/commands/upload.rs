//! Upload command: run local files through the intake pipeline.

use std::path::{Path, PathBuf};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::cli::icons::Icon;
use crate::config::Settings;
use crate::pipeline::{ClientId, Document, IntakeContext, IntakeEvent};

/// Upload `files` for `client`.
pub async fn cmd_upload(
    settings: &Settings,
    client: &str,
    files: &[PathBuf],
    dry_run: bool,
) -> anyhow::Result<()> {
    let client_id = ClientId::new(client)?;
    let (documents, unreadable) = read_documents(files).await?;

    let (pipeline, memory) = settings.build_pipeline(dry_run)?;
    if dry_run {
        println!(
            "{} Dry run: nothing is sent to Drive",
            Icon::Caution
        );
    }

    println!(
        "{} Processing {} document(s) for {}",
        Icon::Step,
        documents.len(),
        style(client_id.as_str()).bold()
    );

    let (event_tx, mut event_rx) = mpsc::channel::<IntakeEvent>(100);

    let event_handler = tokio::spawn(async move {
        let mut progress: Option<ProgressBar> = None;

        while let Some(event) = event_rx.recv().await {
            match event {
                IntakeEvent::BatchStarted { total } => {
                    let bar = ProgressBar::new(total as u64);
                    bar.set_style(
                        ProgressStyle::default_bar()
                            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                            .unwrap_or_else(|_| ProgressStyle::default_bar())
                            .progress_chars("█▓░"),
                    );
                    progress = Some(bar);
                }
                IntakeEvent::ItemStarted { filename, .. } => {
                    if let Some(ref bar) = progress {
                        bar.set_message(filename);
                    }
                }
                IntakeEvent::StageReached { stage, .. } => {
                    if let Some(ref bar) = progress {
                        bar.set_message(stage.to_string());
                    }
                }
                IntakeEvent::ItemFinished { outcome: item, .. } => {
                    let line = match (&item.category, &item.error) {
                        (_, Some(err)) => format!(
                            "  {} {} ({}): {}",
                            Icon::for_item(false),
                            item.filename,
                            item.stage,
                            err
                        ),
                        (Some(category), None) => format!(
                            "  {} {} {} {}",
                            Icon::for_item(true),
                            item.filename,
                            Icon::Detail,
                            category
                        ),
                        (None, None) => {
                            format!("  {} {}", Icon::for_item(item.is_stored()), item.filename)
                        }
                    };
                    match progress {
                        Some(ref bar) => {
                            bar.suspend(|| println!("{}", line));
                            bar.inc(1);
                        }
                        None => println!("{}", line),
                    }
                }
                IntakeEvent::BatchFinished { .. } => {
                    if let Some(bar) = progress.take() {
                        bar.finish_and_clear();
                    }
                }
            }
        }
    });

    let ctx = IntakeContext::new(client_id);
    let report = pipeline
        .process_batch(&ctx, &documents, Some(event_tx))
        .await;
    let _ = event_handler.await;

    let failed = report.failed() + unreadable;
    if failed == 0 {
        println!("{} {} document(s) stored", Icon::Done, report.stored());
    } else {
        println!(
            "{} {} stored, {} failed",
            Icon::Caution,
            report.stored(),
            failed
        );
    }

    if let Some(memory) = memory {
        for item in report.items.iter().filter(|i| i.is_stored()) {
            if let Some(path) = item.file_id.as_deref().and_then(|id| memory.folder_path(id)) {
                println!("  {} {}", Icon::Detail, path);
            }
        }
    }

    if report.stored() == 0 {
        anyhow::bail!("No documents were stored");
    }
    Ok(())
}

/// Read every file, returning the documents and how many could not be read.
async fn read_documents(files: &[PathBuf]) -> anyhow::Result<(Vec<Document>, usize)> {
    let mut documents = Vec::with_capacity(files.len());
    let mut unreadable = 0;
    for path in files {
        match tokio::fs::read(path).await {
            Ok(content) => documents.push(Document::new(display_name(path), content, None)),
            Err(e) => {
                eprintln!("{} Cannot read {}: {}", Icon::Failed, path.display(), e);
                unreadable += 1;
            }
        }
    }

    if documents.is_empty() {
        anyhow::bail!("None of the given files could be read");
    }
    Ok((documents, unreadable))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
