use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

/// Output location for `file_name`, creating `dir` if needed.
pub fn output_path(dir: &Path, file_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    Ok(dir.join(file_name))
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    tracing::debug!(path = %path.display(), "wrote json");
    Ok(())
}

/// Markdown rendering of the first `max_rows` rows.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    match render_table(rows, max_rows) {
        Some(table) => println!("{}\n", table),
        None => println!("(no rows)\n"),
    }
}

/// Titled preview followed by where the full table went.
pub fn preview_section<T>(title: &str, rows: &[T], max_rows: usize, exported_to: Option<&Path>)
where
    T: Tabled + Clone,
{
    println!("{}\n", title);
    preview_table_rows(rows, max_rows);
    if let Some(path) = exported_to {
        println!("(Full table exported to {})\n", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CountRow;

    fn rows() -> Vec<CountRow> {
        vec![
            CountRow { label: "Hidden Gem (Grow)".to_string(), count: 3 },
            CountRow { label: "Dormant (Monitor)".to_string(), count: 1 },
        ]
    }

    #[test]
    fn csv_uses_serde_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_path(&dir.path().join("nested"), "counts.csv").unwrap();
        write_csv(&path, &rows()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Kategori,Jumlah"));
        assert_eq!(lines.next(), Some("Hidden Gem (Grow),3"));
    }

    #[test]
    fn json_round_trips_through_serde_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.json");
        write_json(&path, &rows()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v[1]["Jumlah"], 1);
    }

    #[test]
    fn render_truncates_and_handles_empty() {
        let table = render_table(&rows(), 1).unwrap();
        assert!(table.contains("Hidden Gem (Grow)"));
        assert!(!table.contains("Dormant"));
        assert!(render_table::<CountRow>(&[], 5).is_none());
    }
}
