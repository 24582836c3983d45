//! Classification commands.

use std::path::Path;

use console::style;

use crate::cli::icons::Icon;
use crate::config::Settings;
use crate::pipeline::Document;

/// Classify a file (OCR included) or a piece of text.
pub async fn cmd_classify(
    settings: &Settings,
    file: Option<&Path>,
    text: Option<&str>,
) -> anyhow::Result<()> {
    let classifier = settings.classifier()?;

    let text = match (text, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => {
            let content = tokio::fs::read(path).await?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            // Drive OCR needs credentials and a scratch folder; without them
            // only the offline converters are used.
            let offline = settings.root_folder.is_none() || settings.credentials().is_none();
            let (pipeline, _) = settings.build_pipeline(offline)?;

            println!("{} Extracting text from {}", Icon::Step, path.display());
            pipeline
                .extract_text(&Document::new(name, content, None))
                .await?
        }
        (None, None) => anyhow::bail!("Give a file or --text"),
    };

    let classification = classifier.classify(&text);
    match classification.matched_keyword {
        Some(keyword) => println!(
            "{} {} {}",
            style(&classification.category).green().bold(),
            Icon::Detail,
            style(format!("keyword '{}'", keyword)).dim()
        ),
        None => println!(
            "{} {} no keyword matched",
            style(&classification.category).yellow().bold(),
            Icon::Caution
        ),
    }

    Ok(())
}

/// List categories in priority order.
pub fn cmd_categories(settings: &Settings) -> anyhow::Result<()> {
    let dictionary = &settings.dictionary;

    for (i, entry) in dictionary.categories.iter().enumerate() {
        println!("{:>2}. {}", i + 1, style(&entry.name).bold());
        println!("    {} {}", Icon::Keyword, entry.keywords.join(", "));
    }
    println!(
        "    {} fallback: {}",
        Icon::Detail,
        style(&dictionary.fallback).yellow()
    );

    if dictionary.is_default() {
        println!("{}", style("(built-in dictionary)").dim());
    }
    Ok(())
}
