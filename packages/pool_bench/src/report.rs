use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::{Environment, Error, Result, SortedBatch, format_duration};

const STYLE: &str = r#"
      body { font-family: "Times New Roman", Times, serif; background-color: #edf2ef; }
      table { width: 100%; }
      table, th, td { border: 1px solid black; border-collapse: collapse; }
      th, td { padding: 10px; margin: 0 auto; text-align: center; }
      tr:nth-child(even) { background-color: #eee; }
      tr:nth-child(odd) { background-color: #fff; }
      th { background-color: #fff; color: black; }
      h5 { margin: 0 auto; }
      caption { font-size: 14px; text-align: left; }
"#;

/// The measurements of one configuration, shown as one column of the report.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReportColumn {
    label: String,
    batch: SortedBatch,
}

impl ReportColumn {
    /// A column with the given heading and sorted measurements.
    #[must_use]
    pub fn new(label: impl Into<String>, batch: SortedBatch) -> Self {
        Self {
            label: label.into(),
            batch,
        }
    }

    /// The column heading.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The measurements, ascending.
    #[must_use]
    pub fn batch(&self) -> &SortedBatch {
        &self.batch
    }
}

/// Everything that goes into a report.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BenchReport {
    environment: Environment,
    columns: Vec<ReportColumn>,
}

impl BenchReport {
    /// Assembles a report from the captured environment and one column per configuration.
    #[must_use]
    pub fn new(environment: Environment, columns: Vec<ReportColumn>) -> Self {
        Self {
            environment,
            columns,
        }
    }

    /// The environment the measurements were taken in.
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// One column per configuration, in display order.
    #[must_use]
    pub fn columns(&self) -> &[ReportColumn] {
        &self.columns
    }

    /// Number of detail rows, which is the length of the longest column.
    fn row_count(&self) -> usize {
        self.columns
            .iter()
            .map(|column| column.batch.len())
            .max()
            .unwrap_or_default()
    }
}

/// Renders the report as a self-contained HTML document.
#[must_use]
pub fn render_html(report: &BenchReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n  <head>\n");
    html.push_str("    <meta charset=\"utf-8\">\n");
    html.push_str("    <title>Multithreading/Multiprocessing benchmark results</title>\n");
    html.push_str("    <style>");
    html.push_str(STYLE);
    html.push_str("    </style>\n  </head>\n  <body>\n");
    html.push_str("    <h2>Multithreading/Multiprocessing benchmark results</h2>\n");

    html.push_str("    <h3>Execution environment</h3>\n");
    for (caption, value) in report.environment.facts() {
        writeln!(html, "    <h5>{caption}: {}</h5>", escape(&value))
            .expect("writing to a String is infallible");
    }

    html.push_str("    <h3>Test results</h3>\n");
    html.push_str("    <table>\n");
    html.push_str(
        "      <caption>The following table shows detailed test results:</caption>\n",
    );
    push_header_row(&mut html, report);

    for row in 0..report.row_count() {
        let cells = report.columns.iter().map(|column| {
            column
                .batch
                .durations()
                .get(row)
                .map_or_else(String::new, |duration| format_duration(*duration))
        });

        push_row(&mut html, &row.to_string(), cells);
    }

    html.push_str("    </table>\n");

    html.push_str("    <h3>Summary</h3>\n");
    html.push_str("    <table>\n");
    html.push_str(
        "      <caption>The following table shows the median of all results:</caption>\n",
    );
    push_header_row(&mut html, report);

    let medians = report.columns.iter().map(|column| {
        column
            .batch
            .median()
            .map_or_else(String::new, format_duration)
    });
    push_row(&mut html, "Median", medians);

    html.push_str("    </table>\n");
    html.push_str("  </body>\n</html>\n");

    html
}

fn push_header_row(html: &mut String, report: &BenchReport) {
    html.push_str("      <tr>\n        <th>Execution</th>\n");

    for column in &report.columns {
        writeln!(html, "        <th>{}</th>", escape(&column.label))
            .expect("writing to a String is infallible");
    }

    html.push_str("      </tr>\n");
}

fn push_row(html: &mut String, caption: &str, cells: impl Iterator<Item = String>) {
    html.push_str("      <tr>\n");
    writeln!(html, "        <td>{}</td>", escape(caption))
        .expect("writing to a String is infallible");

    for cell in cells {
        writeln!(html, "        <td>{}</td>", escape(&cell))
            .expect("writing to a String is infallible");
    }

    html.push_str("      </tr>\n");
}

/// Escapes text for inclusion in HTML element content.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }

    escaped
}

/// Renders the report and writes it to `path`, replacing any existing file.
pub fn write_report(report: &BenchReport, path: &Path) -> Result<()> {
    fs::write(path, render_html(report)).map_err(|source| Error::WriteReport {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), "report written");

    Ok(())
}
