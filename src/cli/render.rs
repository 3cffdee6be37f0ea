//! Output rendering for report tables and entities
//!
//! Formatters are pure functions from a [`ReportTable`] (or a serializable
//! entity) to text; [`write_output`] decides where the text goes.

use chrono::Utc;
use console::style;
use miette::{IntoDiagnostic, Result};
use rust_embed::Embed;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tabled::{builder::Builder, settings::Style};
use tera::Tera;

use crate::analytics::ReportTable;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::error::ShgError;
use crate::core::identity::EntityId;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

const REPORT_TEMPLATE: &str = "report.html.tera";

fn text_table(table: &ReportTable, markdown: bool) -> String {
    let mut builder = Builder::default();
    for record in table.to_records() {
        builder.push_record(record);
    }
    let mut built = builder.build();
    if markdown {
        built.with(Style::markdown());
    } else {
        built.with(Style::rounded());
    }
    built.to_string()
}

pub fn to_csv(table: &ReportTable) -> crate::core::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in table.to_records() {
        writer.write_record(&record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ShgError::Render(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ShgError::Render(e.to_string()))
}

pub fn to_html(table: &ReportTable, title: &str) -> crate::core::Result<String> {
    let file = EmbeddedTemplates::get(REPORT_TEMPLATE)
        .ok_or_else(|| ShgError::Render(format!("template not found: {}", REPORT_TEMPLATE)))?;
    let source =
        std::str::from_utf8(&file.data).map_err(|e| ShgError::Render(e.to_string()))?;

    // the .html name turns on autoescaping
    let mut tera = Tera::default();
    tera.add_raw_template("report.html", source)?;

    let records = table.to_records();
    let mut context = tera::Context::new();
    context.insert("title", title);
    context.insert("report", &table.title);
    context.insert("generated_at", &Utc::now().format("%Y-%m-%d %H:%M UTC").to_string());
    context.insert("headers", &records[0]);
    context.insert("rows", &records[1..]);
    Ok(tera.render("report.html", &context)?)
}

/// Render a report table in the requested format
pub fn render_table(
    table: &ReportTable,
    format: OutputFormat,
    to_file: bool,
    title: &str,
) -> crate::core::Result<String> {
    let rendered = match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&table.to_json())?;
            json.push('\n');
            json
        }
        OutputFormat::Csv => to_csv(table)?,
        OutputFormat::Html => to_html(table, title)?,
        OutputFormat::Md => format!("# {}\n\n{}\n", title, text_table(table, true)),
        OutputFormat::Id => table
            .rows
            .iter()
            .filter_map(|row| row.first())
            .map(|cell| format!("{}\n", cell.csv_text()))
            .collect(),
        OutputFormat::Auto | OutputFormat::Table => {
            format!("{}\n", text_table(table, to_file))
        }
    };
    Ok(rendered)
}

/// Write to `--output` when given, otherwise stdout
pub fn write_output(content: &str, global: &GlobalOpts) -> Result<()> {
    match &global.output {
        Some(path) => {
            write_file(content, path)?;
            if !global.quiet && !global.is_json() {
                eprintln!("Report written to: {}", path.display());
            }
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn write_file(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).into_diagnostic()?;
    }
    let file = File::create(path).into_diagnostic()?;
    let mut writer = BufWriter::new(file);
    writer.write_all(content.as_bytes()).into_diagnostic()?;
    writer.flush().into_diagnostic()
}

/// Render and emit a report table
pub fn emit_table(table: &ReportTable, global: &GlobalOpts, title: &str) -> Result<()> {
    let content = render_table(table, global.format, global.output.is_some(), title)?;
    write_output(&content, global)
}

/// Emit a list: JSON keeps full entity fidelity, other formats use the table view
pub fn emit_list<T: Serialize>(items: &[T], table: &ReportTable, global: &GlobalOpts) -> Result<()> {
    if global.is_json() {
        let mut json = serde_json::to_string_pretty(items).into_diagnostic()?;
        json.push('\n');
        return write_output(&json, global);
    }
    emit_table(table, global, &table.title)?;
    if matches!(global.format, OutputFormat::Auto | OutputFormat::Table)
        && global.output.is_none()
        && !global.quiet
    {
        eprintln!("{} record(s) found", table.rows.len());
    }
    Ok(())
}

/// Emit a single entity: YAML by default, JSON on request
pub fn emit_entity<T: Serialize>(item: &T, id_text: &str, global: &GlobalOpts) -> Result<()> {
    let content = match global.format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(item).into_diagnostic()?;
            json.push('\n');
            json
        }
        OutputFormat::Id => format!("{}\n", id_text),
        _ => serde_yml::to_string(item).into_diagnostic()?,
    };
    write_output(&content, global)
}

/// Acknowledge a newly created record
pub fn emit_created<T: Serialize>(
    item: &T,
    id: &EntityId,
    short_id: &str,
    message: &str,
    global: &GlobalOpts,
) -> Result<()> {
    match global.format {
        OutputFormat::Id => println!("{}", id),
        OutputFormat::Json => emit_entity(item, short_id, global)?,
        _ if !global.quiet => println!(
            "{} {} {}",
            style("✓").green(),
            message,
            style(short_id).cyan()
        ),
        _ => {}
    }
    Ok(())
}

/// Acknowledge a change to an existing record
pub fn emit_done(message: &str, short_id: &str, global: &GlobalOpts) {
    if global.quiet {
        return;
    }
    if global.is_json() {
        println!("{}", serde_json::json!({ "id": short_id, "message": message }));
    } else {
        println!("{} {} {}", style("✓").green(), message, style(short_id).cyan());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{Cell, Column};

    fn table() -> ReportTable {
        let mut table = ReportTable::new(
            "Group Summary Report",
            vec![
                Column::new("location", "Location"),
                Column::new("total_members", "Total Members"),
                Column::new("savings_range", "Savings Range"),
            ],
        );
        table.push(vec![
            Cell::text("Oromia, East"),
            Cell::Count(6),
            Cell::range(Some(10.0), Some(20.5)),
        ]);
        table.push(vec![Cell::text("<Amhara>"), Cell::Count(0), Cell::Null]);
        table
    }

    #[test]
    fn test_csv_output() {
        insta::assert_snapshot!(to_csv(&table()).unwrap(), @r###"
        Location,Total Members,Savings Range
        "Oromia, East",6,10.00 - 20.50
        <Amhara>,0,
        "###);
    }

    #[test]
    fn test_json_output() {
        let out = render_table(&table(), OutputFormat::Json, false, "x").unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["total_members"], 6);
        assert_eq!(value[0]["savings_range"]["max"], 20.5);
        assert!(value[1]["savings_range"].is_null());
    }

    #[test]
    fn test_markdown_output() {
        let out = render_table(&table(), OutputFormat::Md, true, "Adama").unwrap();
        assert!(out.starts_with("# Adama\n"));
        assert!(out.contains("| Location"));
    }

    #[test]
    fn test_html_escapes_cells() {
        let out = to_html(&table(), "Adama Program").unwrap();
        assert!(out.contains("<title>Adama Program</title>"));
        assert!(out.contains("&lt;Amhara&gt;"));
        assert!(!out.contains("<Amhara>"));
    }

    #[test]
    fn test_id_output_uses_first_column() {
        let out = render_table(&table(), OutputFormat::Id, false, "x").unwrap();
        assert_eq!(out, "Oromia, East\n<Amhara>\n");
    }
}
