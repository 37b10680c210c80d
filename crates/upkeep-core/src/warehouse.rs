//! Full rebuild of the reporting warehouse from a version-controlled SQL script.
//!
//! The splitter understands quoted text and SQL comments but not stored-routine
//! bodies: a `DELIMITER` directive is rejected rather than mis-split.

use crate::{Error, Result, SessionProvider};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

const DRY_RUN_PREVIEW: usize = 200;
const LOG_PREVIEW: usize = 120;

/// Classification used for progress logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatementKind {
    Ddl,
    Insert,
    Update,
    Delete,
    Read,
}

impl StatementKind {
    pub fn classify(sql: &str) -> Self {
        let first = sql
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();

        match first.as_str() {
            "CREATE" | "DROP" | "ALTER" | "TRUNCATE" | "RENAME" => StatementKind::Ddl,
            "INSERT" => StatementKind::Insert,
            "UPDATE" | "REPLACE" => StatementKind::Update,
            "DELETE" => StatementKind::Delete,
            _ => StatementKind::Read,
        }
    }

    pub fn is_write(self) -> bool {
        !matches!(self, StatementKind::Read)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// 1-based position in the script.
    pub index: usize,
    pub sql: String,
    pub kind: StatementKind,
}

impl Statement {
    /// Single-line form truncated to `max_chars`.
    pub fn preview(&self, max_chars: usize) -> String {
        let one_line = self.sql.split_whitespace().collect::<Vec<_>>().join(" ");
        one_line.chars().take(max_chars).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshSummary {
    pub ok: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
    pub statements: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_sec: Option<f64>,
}

/// Case-insensitive `keyword` at `at`, followed by whitespace.
fn keyword_at(chars: &[char], at: usize, keyword: &str) -> bool {
    let len = keyword.chars().count();
    chars.len() > at + len
        && chars[at..at + len]
            .iter()
            .zip(keyword.chars())
            .all(|(c, k)| c.eq_ignore_ascii_case(&k))
        && chars[at + len].is_whitespace()
}

/// Index of the line break ending the line that contains `from`, or the end.
fn line_end(chars: &[char], from: usize) -> usize {
    chars[from..]
        .iter()
        .position(|&c| c == '\n')
        .map_or(chars.len(), |offset| from + offset)
}

/// Index just past the `*/` closing a block comment opened before `from`.
fn block_comment_end(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len().saturating_sub(1))
        .find(|&i| chars[i] == '*' && chars[i + 1] == '/')
        .map(|i| i + 2)
}

/// Split a script into statements.
///
/// Outside quotes, `-- ` and `#` comments run to the end of the line, a `--`
/// opening a line is a comment too, and `/* ... */` blocks are dropped
/// (`/*! ... */` executable comments are kept). `;` splits statements unless it
/// sits inside `'...'`, `"..."` or `` `...` `` quoting. A `DELIMITER` directive
/// at the start of a statement is rejected.
pub fn parse_script(text: &str) -> Result<Vec<Statement>> {
    let chars: Vec<char> = text.chars().collect();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut line = 1;
    let mut line_start = true;
    let mut i = 0;

    let finish = |buf: &mut String, out: &mut Vec<Statement>| {
        let sql = buf.trim();
        if !sql.is_empty() {
            out.push(Statement {
                index: out.len() + 1,
                sql: sql.to_string(),
                kind: StatementKind::classify(sql),
            });
        }
        buf.clear();
    };

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if let Some(q) = quote {
            current.push(c);
            if c == '\n' {
                line += 1;
            }
            if c == '\\' && q != '`' {
                if let Some(escaped) = next {
                    current.push(escaped);
                    if escaped == '\n' {
                        line += 1;
                    }
                    i += 1;
                }
            } else if c == q {
                if next == Some(q) {
                    // Doubled quote is an escaped quote.
                    current.push(q);
                    i += 1;
                } else {
                    quote = None;
                }
            }
            i += 1;
            continue;
        }

        match c {
            '\n' => {
                current.push(c);
                line += 1;
                line_start = true;
                i += 1;
                continue;
            }
            '-' if next == Some('-')
                && (line_start || chars.get(i + 2).map_or(true, |n| n.is_whitespace())) =>
            {
                i = line_end(&chars, i);
                continue;
            }
            '#' => {
                i = line_end(&chars, i);
                continue;
            }
            '/' if next == Some('*') => {
                let end = block_comment_end(&chars, i + 2).ok_or_else(|| {
                    Error::Script(format!("unterminated comment on line {}", line))
                })?;
                let comment = &chars[i..end];
                if chars.get(i + 2) == Some(&'!') {
                    current.extend(comment);
                } else {
                    current.push(' ');
                }
                line += comment.iter().filter(|&&ch| ch == '\n').count();
                line_start = false;
                i = end;
                continue;
            }
            _ => {}
        }

        if current.trim().is_empty() && keyword_at(&chars, i, "DELIMITER") {
            return Err(Error::Script(format!(
                "DELIMITER directive on line {} is not supported",
                line
            )));
        }

        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                current.push(c);
            }
            ';' => finish(&mut current, &mut statements),
            _ => current.push(c),
        }
        if !c.is_whitespace() {
            line_start = false;
        }
        i += 1;
    }

    if let Some(q) = quote {
        return Err(Error::Script(format!(
            "unterminated {} quote in statement {}",
            q,
            statements.len() + 1
        )));
    }
    finish(&mut current, &mut statements);

    Ok(statements)
}

/// Replays the warehouse script on a single session.
pub struct WarehouseJob {
    script_path: PathBuf,
}

impl WarehouseJob {
    pub fn new(script_path: impl Into<PathBuf>) -> Self {
        Self {
            script_path: script_path.into(),
        }
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    pub async fn load(&self) -> Result<Vec<Statement>> {
        let text = match tokio::fs::read_to_string(&self.script_path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::error!("Warehouse script not found: {}", self.script_path.display());
                return Err(Error::ScriptNotFound(
                    self.script_path.display().to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        parse_script(&text)
    }

    /// Execute every statement in order. The first failure stops the run and
    /// propagates; statements already executed stay committed.
    pub async fn run(&self, sessions: &dyn SessionProvider, dry_run: bool) -> Result<RefreshSummary> {
        let started = Instant::now();
        let statements = self.load().await?;
        let total = statements.len();

        tracing::info!(
            "Warehouse refresh start: file={}, statements={}",
            self.script_path.display(),
            total
        );

        if dry_run {
            for stmt in &statements {
                tracing::info!("[DRY-RUN] #{}: {}", stmt.index, stmt.preview(DRY_RUN_PREVIEW));
            }
            return Ok(RefreshSummary {
                ok: true,
                dry_run: true,
                statements: total,
                executed: None,
                elapsed_sec: None,
            });
        }

        let mut session = sessions.open_session().await?;
        let mut executed = 0;

        for stmt in &statements {
            tracing::info!(
                "Executing statement {}/{} ({:?}): {}",
                stmt.index,
                total,
                stmt.kind,
                stmt.preview(LOG_PREVIEW)
            );

            match session.execute(&stmt.sql).await {
                Ok(rows) => {
                    executed += 1;
                    if stmt.kind.is_write() {
                        tracing::debug!("Statement {} affected {} rows", stmt.index, rows);
                    }
                }
                Err(e) => {
                    tracing::error!(
                        "Statement {}/{} ({:?}) failed: {}\nSQL: {}",
                        stmt.index,
                        total,
                        stmt.kind,
                        e,
                        stmt.sql
                    );
                    return Err(Error::StatementFailed {
                        index: stmt.index,
                        total,
                        message: e.to_string(),
                    });
                }
            }
        }

        let elapsed = started.elapsed().as_secs_f64();
        tracing::info!(
            "Warehouse refresh completed: executed={}/{}, elapsed={:.1}s",
            executed,
            total,
            elapsed
        );

        Ok(RefreshSummary {
            ok: true,
            dry_run: false,
            statements: total,
            executed: Some(executed),
            elapsed_sec: Some(elapsed),
        })
    }
}
