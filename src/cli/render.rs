use sheetdb::{MoveMethod, PersistReport, Sheet};

/// Aligned plain-text table
pub fn table(sheet: &Sheet) -> String {
    let columns = sheet
        .rows()
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(sheet.header().len()))
        .max()
        .unwrap_or(0);

    if columns == 0 {
        return "Empty sheet\n".to_string();
    }

    let cell = |row: &[String], i: usize| row.get(i).cloned().unwrap_or_default();
    let header: Vec<String> = sheet.header().to_vec();
    let rows: Vec<Vec<String>> = sheet
        .rows()
        .iter()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();

    // Calculate column widths
    let mut widths = vec![0usize; columns];
    for row in std::iter::once(&header).chain(rows.iter()) {
        for (i, value) in row.iter().enumerate() {
            widths[i] = widths[i].max(value.chars().count());
        }
    }

    let format_row = |row: &[String]| {
        (0..columns)
            .map(|i| format!("{:width$}", cell(row, i), width = widths[i]))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&format_row(&header[..]));
    out.push('\n');

    let separator: String = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");
    out.push_str(&separator);
    out.push('\n');

    for row in &rows {
        out.push_str(&format_row(&row[..]));
        out.push('\n');
    }

    out.push_str(&format!("\n{} row(s)\n", rows.len()));
    out
}

pub fn report(report: Option<&PersistReport>) -> String {
    let Some(report) = report else {
        return "No changes to save\n".to_string();
    };

    let mut out = format!(
        "Saved {} ({} bytes, {})\n",
        report.target.display(),
        report.staged_bytes,
        describe(report.install.method)
    );
    if let Some(backup) = &report.backup {
        out.push_str(&format!("Previous version: {}\n", backup.path().display()));
    }
    out
}

fn describe(method: MoveMethod) -> String {
    match method {
        MoveMethod::Renamed => "renamed into place".to_string(),
        MoveMethod::Copied { bytes } => format!("copied {} bytes into place", bytes),
    }
}
