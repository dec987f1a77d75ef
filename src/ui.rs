use colored::Colorize;
use declarative::{DiffEntry, DiffKind, DiffResult, RunSummary};
use std::fmt::Display;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a step indicator
pub fn step(num: usize, total: usize, msg: &str) {
    println!("{} {}", format!("[{}/{}]", num, total).blue().bold(), msg);
}

// ============================================================================
// Diff Rendering
// ============================================================================

/// One-line rendering of a diff entry, without color
pub fn entry_line<K: Display>(entry: &DiffEntry<K>) -> String {
    match entry.kind {
        DiffKind::Modified => format!("{} {}", entry.kind.symbol(), entry.key),
        DiffKind::Added | DiffKind::Deleted => {
            format!("{} {}: {}", entry.kind.symbol(), entry.key, entry.description)
        }
    }
}

/// Print every entry of a diff, property changes indented below modifications
pub fn diff_entries<K: Display>(result: &DiffResult<K>) {
    for entry in &result.entries {
        let line = entry_line(entry);
        let line = match entry.kind {
            DiffKind::Added => line.green(),
            DiffKind::Modified => line.yellow(),
            DiffKind::Deleted => line.red(),
        };
        println!("  {}", line);
        for change in &entry.changes {
            dim(&format!("    {}", change));
        }
    }
}

/// Print diff warnings
pub fn diff_warnings<K>(result: &DiffResult<K>) {
    for warning in &result.warnings {
        warn(warning);
    }
}

/// Counts line for a diff, e.g. `2 to add, 1 to change, 0 to delete`
pub fn diff_counts<K>(result: &DiffResult<K>) -> String {
    let s = &result.summary;
    format!(
        "{} to add, {} to change, {} to delete",
        s.added, s.modified, s.deleted
    )
}

/// Counts line for a multi-application run
pub fn run_counts(summary: &RunSummary) -> String {
    let mut line = format!("{} succeeded", summary.succeeded);
    if summary.failed > 0 {
        line.push_str(&format!(", {} failed", summary.failed));
    }
    if summary.skipped > 0 {
        line.push_str(&format!(", {} skipped", summary.skipped));
    }
    line
}

// ============================================================================
// Tests
// ============================================================================
