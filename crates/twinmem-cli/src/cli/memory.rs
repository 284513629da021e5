//! Memory commands: add, recall, graph.

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde_json::Value;

use twinmem_core::memory::graph::GraphStore;
use twinmem_types::memory::{Fact, GraphStatus, VectorStatus, WriteReport};

use crate::state::AppState;

/// Parse `--metadata`, which must be a JSON object.
pub fn parse_metadata(raw: Option<&str>) -> Result<Value> {
    let Some(raw) = raw else {
        return Ok(Value::Null);
    };
    let value: Value = serde_json::from_str(raw).context("--metadata is not valid JSON")?;
    if !value.is_object() {
        bail!("--metadata must be a JSON object");
    }
    Ok(value)
}

/// Reports where at least one path failed.
pub fn failed_writes(reports: &[WriteReport]) -> usize {
    reports
        .iter()
        .filter(|r| {
            matches!(r.vector_status, VectorStatus::Failed(_))
                || matches!(r.graph_status, GraphStatus::Failed(_))
        })
        .count()
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{cut}...")
}

fn vector_cell(status: &VectorStatus) -> Cell {
    match status {
        VectorStatus::Written(_) => Cell::new("written").fg(Color::Green),
        VectorStatus::Failed(reason) => Cell::new(format!("failed: {reason}")).fg(Color::Red),
    }
}

fn graph_cell(status: &GraphStatus) -> Cell {
    match status {
        GraphStatus::Written(_) => Cell::new(status.to_string()).fg(Color::Green),
        GraphStatus::Skipped => Cell::new("skipped").fg(Color::DarkGrey),
        GraphStatus::Failed(reason) => Cell::new(format!("failed: {reason}")).fg(Color::Red),
    }
}

/// Dual-write each text for `subject` and print both statuses.
///
/// Fails after printing when any path of any fact failed.
///
/// ```bash
/// twinmem add alex "Alex is a Python developer" "Alex loves Neo4j"
/// ```
pub async fn add_facts(state: &AppState, subject: &str, texts: &[String], json: bool) -> Result<()> {
    let facts: Vec<Fact> = texts.iter().map(|t| Fact::new(subject, t.as_str())).collect();
    let reports = state.coordinator.write_all(&facts).await;

    if json {
        let rows: Vec<Value> = facts
            .iter()
            .zip(&reports)
            .map(|(fact, report)| {
                serde_json::json!({
                    "text": fact.text,
                    "report": report,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Fact").fg(Color::White),
            Cell::new("Vector").fg(Color::White),
            Cell::new("Graph").fg(Color::White),
        ]);
        for (fact, report) in facts.iter().zip(&reports) {
            table.add_row(vec![
                Cell::new(shorten(&fact.text, 60)),
                vector_cell(&report.vector_status),
                graph_cell(&report.graph_status),
            ]);
        }

        println!();
        println!("  Stored facts for '{}'", style(subject).cyan().bold());
        println!();
        println!("{table}");
        println!();
    }

    let failed = failed_writes(&reports);
    if failed > 0 {
        bail!("{failed} of {} facts were not fully stored", reports.len());
    }
    Ok(())
}

/// Print the read-back of the vector store for `subject`.
pub async fn recall(state: &AppState, subject: &str, json: bool) -> Result<()> {
    let entries = state
        .coordinator
        .verifier()
        .verify(subject)
        .await
        .with_context(|| format!("Failed to read memories for '{subject}'"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!();
        println!(
            "  {} No memories for '{}'.",
            style("i").blue().bold(),
            style(subject).cyan(),
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Memory").fg(Color::White),
        Cell::new("Metadata").fg(Color::White),
        Cell::new("Date").fg(Color::White),
    ]);
    for entry in &entries {
        let metadata = if entry.payload.is_null() {
            String::new()
        } else {
            entry.payload.to_string()
        };
        table.add_row(vec![
            Cell::new(shorten(&entry.text, 60)).fg(Color::White),
            Cell::new(shorten(&metadata, 30)).fg(Color::DarkGrey),
            Cell::new(entry.created_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("  Memories for '{}'", style(subject).cyan().bold());
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} memor{}",
        style(entries.len()).bold(),
        if entries.len() == 1 { "y" } else { "ies" }
    );
    println!();

    Ok(())
}

/// Print the graph relations stored for `subject`.
pub async fn graph(state: &AppState, subject: &str, json: bool) -> Result<()> {
    let triples = state
        .coordinator
        .graph_store()
        .triples_for_subject(subject)
        .await
        .with_context(|| format!("Failed to read relations for '{subject}'"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&triples)?);
        return Ok(());
    }

    if triples.is_empty() {
        println!();
        println!(
            "  {} No relations for '{}'.",
            style("i").blue().bold(),
            style(subject).cyan(),
        );
        println!();
        return Ok(());
    }

    println!();
    for triple in &triples {
        println!(
            "  {} {} {}",
            style(&triple.source).cyan(),
            style(format!("-[{}]->", triple.relation)).dim(),
            style(&triple.target).cyan()
        );
    }
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use twinmem_types::memory::VectorRecord;

    fn report(vector: VectorStatus, graph: GraphStatus) -> WriteReport {
        WriteReport {
            subject: "u1".into(),
            vector_status: vector,
            graph_status: graph,
        }
    }

    fn written() -> VectorStatus {
        VectorStatus::Written(VectorRecord::from_fact(&Fact::new("u1", "x"), vec![], "m").id)
    }

    #[test]
    fn test_parse_metadata() {
        assert_eq!(parse_metadata(None).unwrap(), Value::Null);
        assert_eq!(
            parse_metadata(Some(r#"{"source":"cli"}"#)).unwrap()["source"],
            "cli"
        );
        assert!(parse_metadata(Some("[1,2]")).is_err());
        assert!(parse_metadata(Some("{nope")).is_err());
    }

    #[test]
    fn test_failed_writes_ignores_skipped_graph() {
        let reports = vec![
            report(written(), GraphStatus::Skipped),
            report(written(), GraphStatus::Written(2)),
            report(VectorStatus::Failed("down".into()), GraphStatus::Written(1)),
            report(written(), GraphStatus::Failed("extraction failed".into())),
        ];
        assert_eq!(failed_writes(&reports), 2);
        assert_eq!(failed_writes(&reports[..2]), 0);
    }

    #[test]
    fn test_shorten_respects_char_boundaries() {
        assert_eq!(shorten("short", 60), "short");
        let long = "é".repeat(70);
        let out = shorten(&long, 60);
        assert_eq!(out.chars().count(), 60);
        assert!(out.ends_with("..."));
    }
}
