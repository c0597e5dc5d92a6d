use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::report::{ClassSummary, IndividualReport, RecordStatus, SchoolSummary};

/// UTF-8 byte-order-mark the browser app prepends so spreadsheet software
/// picks up the encoding.
const BOM: &str = "\u{feff}";

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

/// Serializes a report to the original export byte format: BOM, unquoted
/// header line, every data cell quoted, lines joined with `\n`.
pub fn render_csv(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.join(","));
    for row in rows {
        lines.push(
            row.iter()
                .map(|cell| quote(cell))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    format!("{}{}", BOM, lines.join("\n"))
}

/// `<report-name>_<ISO-date>.csv`, dated today (UTC). Names can carry class
/// names like "Grade 1/1", so separator characters are mapped to `-` to keep
/// the result a single path component.
pub fn export_filename(report_name: &str) -> String {
    let safe: String = report_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            c => c,
        })
        .collect();
    format!("{}_{}.csv", safe, Utc::now().format("%Y-%m-%d"))
}

pub fn write_export(
    out_dir: &Path,
    report_name: &str,
    headers: &[&str],
    rows: &[Vec<String>],
) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(export_filename(report_name));
    std::fs::write(&path, render_csv(headers, rows))?;
    Ok(path)
}

fn fmt_num(v: f64) -> String {
    format!("{}", v)
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(fmt_num).unwrap_or_else(|| "-".to_string())
}

pub const INDIVIDUAL_HEADERS: [&str; 4] = ["Test item", "Unit", "Score", "Level"];

pub fn individual_rows(report: &IndividualReport) -> Vec<Vec<String>> {
    report
        .results
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                r.unit.clone(),
                fmt_num(r.score),
                r.level.label().to_string(),
            ]
        })
        .collect()
}

pub const CLASS_HEADERS: [&str; 6] = [
    "Student ID",
    "Full name",
    "Weight (kg)",
    "Height (cm)",
    "BMI",
    "Status",
];

pub fn class_rows(summary: &ClassSummary) -> Vec<Vec<String>> {
    summary
        .rows
        .iter()
        .map(|row| {
            vec![
                row.student_no.clone(),
                row.name.clone(),
                fmt_opt(row.weight),
                fmt_opt(row.height),
                fmt_opt(row.bmi),
                match row.status {
                    RecordStatus::Done => "Evaluated".to_string(),
                    RecordStatus::Pending => "Pending".to_string(),
                },
            ]
        })
        .collect()
}

pub const SCHOOL_HEADERS: [&str; 3] = ["Category", "Item", "Students"];

/// Sectioned layout matching the original summary export: a BMI block, a
/// blank spacer row, then the fitness-level block.
pub fn school_rows(summary: &SchoolSummary) -> Vec<Vec<String>> {
    let blank = || vec![String::new(), String::new(), String::new()];
    let mut rows = Vec::new();
    rows.push(vec![
        "BMI Distribution".to_string(),
        String::new(),
        String::new(),
    ]);
    for bucket in &summary.bmi_distribution {
        rows.push(vec![
            String::new(),
            bucket.category.label().to_string(),
            bucket.count.to_string(),
        ]);
    }
    rows.push(blank());
    rows.push(vec![
        "Fitness Level Overall".to_string(),
        String::new(),
        String::new(),
    ]);
    for bucket in &summary.level_distribution {
        rows.push(vec![
            String::new(),
            bucket.level.label().to_string(),
            bucket.count.to_string(),
        ]);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_starts_with_bom_and_quotes_data_cells() {
        let out = render_csv(
            &["A", "B"],
            &[vec!["plain".to_string(), "has \"quotes\"".to_string()]],
        );
        assert!(out.starts_with('\u{feff}'));
        let body = out.trim_start_matches('\u{feff}');
        let mut lines = body.lines();
        assert_eq!(lines.next(), Some("A,B"));
        assert_eq!(lines.next(), Some("\"plain\",\"has \"\"quotes\"\"\""));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn export_filename_flattens_path_separators() {
        let name = export_filename("class_fitness_report_Grade 1/1");
        assert!(name.starts_with("class_fitness_report_Grade 1-1_"));
    }

    #[test]
    fn export_filename_has_iso_date_suffix() {
        let name = export_filename("school_fitness_summary");
        assert!(name.starts_with("school_fitness_summary_"));
        assert!(name.ends_with(".csv"));
        // school_fitness_summary_YYYY-MM-DD.csv
        let date = &name["school_fitness_summary_".len()..name.len() - ".csv".len()];
        assert_eq!(date.len(), 10);
        assert_eq!(&date[4..5], "-");
        assert_eq!(&date[7..8], "-");
    }
}
