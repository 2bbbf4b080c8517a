//! Upload command - run one CSV export through the import pipeline

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use staybook_core::services::LogEvent;
use staybook_core::Upload;

use super::{get_context, get_logger, log_event};
use crate::output;

pub fn run(file: &Path, listing: Option<String>, json: bool) -> Result<bool> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("upload"));

    let content =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut upload = Upload::new(file_name, content);
    if let Some(listing) = listing {
        upload = upload.with_listing_hint(listing);
    }

    let ctx = get_context()?;
    let outcome = ctx.import_service.upload(upload);

    if let Some(l) = &logger {
        let _ = l.log_upload(ctx.import_service.collection(), &outcome);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(outcome.success);
    }

    for line in &outcome.logs {
        println!("{}", line);
    }

    let Some(summary) = &outcome.summary else {
        output::error(outcome.error.as_deref().unwrap_or("Échec de l'import"));
        return Ok(false);
    };

    if !summary.skipped.is_empty() {
        println!();
        println!("{}", format!("{} ligne(s) ignorée(s)", summary.skipped.len()).yellow());
        let mut table = output::create_table();
        table.set_header(vec!["Ligne", "Raison"]);
        for skipped in &summary.skipped {
            table.add_row(vec![skipped.line.to_string(), skipped.reason.to_string()]);
        }
        println!("{}", table);
    }

    println!();
    output::success(&format!(
        "{} ajoutée(s), {} doublon(s) dans \"{}\"",
        summary.appended,
        summary.duplicates.len(),
        ctx.import_service.collection()
    ));
    println!("{}", format!("Empreinte : {}", summary.digest).dimmed());

    Ok(true)
}
