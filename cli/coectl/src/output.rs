//! Table and JSON rendering for command results.
//!
//! Results go to stdout; progress and errors stay on stderr so JSON
//! output can be piped.

use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// How command results are rendered.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Aligned text table for humans.
    #[default]
    Table,
    /// Pretty-printed JSON for scripts.
    Json,
}

impl OutputFormat {
    /// Permissive parse; anything other than `json` renders tables.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "json" => Self::Json,
            _ => Self::Table,
        }
    }
}

/// Render rows as a table, with a dimmed note when nothing matched.
pub fn print_table<T: Tabled>(rows: &[T]) {
    if rows.is_empty() {
        println!("{}", "No resources matched.".dimmed());
        return;
    }
    println!("{}", Table::new(rows));
}

/// Render a result structure as pretty-printed JSON.
pub fn print_json<T: Serialize>(data: &T) {
    let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string());
    println!("{json}");
}

/// Print a green success line ahead of a table.
pub fn print_success(message: &str) {
    println!("{} {message}", "Success:".green().bold());
}
