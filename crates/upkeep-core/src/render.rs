//! HTML and plain-text bodies for due-task notifications.

use crate::DueTask;
use chrono::NaiveDate;
use std::fmt::Write;

const CELL: &str = "padding:6px;border:1px solid #ddd";
const MISSING: &str = "—";
const DUE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Escape text for HTML element and attribute content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn cell(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("<td style='{CELL}'>{}</td>", escape_html(v)),
        None => format!("<td style='{CELL}'>{MISSING}</td>"),
    }
}

pub fn subject(within_days: u32, today: NaiveDate) -> String {
    format!(
        "[Maintenance] Due within {} days ({})",
        within_days,
        today.format("%Y-%m-%d")
    )
}

/// Render the due-task table. `generated` is already formatted in the
/// configured timezone.
pub fn render_html(rows: &[DueTask], within_days: u32, generated: &str) -> String {
    let mut body_rows = String::new();

    for row in rows {
        let due = row.next_due_at.format(DUE_FORMAT).to_string();
        body_rows.push_str("<tr>");
        body_rows.push_str(&cell(Some(&row.task_id.to_string())));
        body_rows.push_str(&cell(Some(&row.title)));
        body_rows.push_str(&cell(Some(&due)));
        body_rows.push_str(&cell(Some(row.area()).filter(|a| !a.is_empty())));
        body_rows.push_str("</tr>");
    }

    if rows.is_empty() {
        body_rows = "<tr><td colspan='4' style='padding:8px;border:1px solid #ddd'>No upcoming deadlines.</td></tr>"
            .to_string();
    }

    format!(
        r#"<div style="font-family:system-ui,Segoe UI,Arial,sans-serif">
  <h2>Maintenance due within {within_days} days</h2>
  <p>Generated: {generated}</p>
  <table style="border-collapse:collapse;font-size:14px">
    <thead>
      <tr>
        <th style="{CELL}">#</th>
        <th style="{CELL}">Task</th>
        <th style="{CELL}">Next due</th>
        <th style="{CELL}">Area/Department</th>
      </tr>
    </thead>
    <tbody>{body_rows}</tbody>
  </table>
</div>"#,
        generated = escape_html(generated),
    )
}

/// Plain-text alternative of [`render_html`].
pub fn render_text(rows: &[DueTask], within_days: u32, generated: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Maintenance due within {} days", within_days);
    let _ = writeln!(out, "Generated: {}", generated);
    let _ = writeln!(out);

    if rows.is_empty() {
        let _ = writeln!(out, "No upcoming deadlines.");
        return out;
    }

    for row in rows {
        let area = row.area();
        let _ = writeln!(
            out,
            "- [{}] {} | {} | {}",
            row.task_id,
            row.title,
            row.next_due_at.format(DUE_FORMAT),
            if area.is_empty() { MISSING } else { area }
        );
    }

    out
}
