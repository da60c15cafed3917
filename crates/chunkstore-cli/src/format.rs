//! Output formatting utilities for chunkctl
//!
//! Supports two output formats:
//! - Table: ASCII tables with borders (default)
//! - JSON: Machine-readable JSON

use anyhow::Result;
use clap::ValueEnum;
use colored::*;
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Format and print output based on the selected format
pub struct Formatter {
    format: OutputFormat,
    colored: bool,
}

impl Formatter {
    pub fn new(format: OutputFormat, colored: bool) -> Self {
        Self { format, colored }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Print a list of items
    pub fn print_list<T: Serialize + Tabled>(&self, items: Vec<T>) -> Result<()> {
        match self.format {
            OutputFormat::Table => self.print_table(items),
            OutputFormat::Json => self.print_json(&items),
        }
    }

    /// Print a single item
    pub fn print_single<T: Serialize + Tabled>(&self, item: T) -> Result<()> {
        match self.format {
            OutputFormat::Table => self.print_table(vec![item]),
            OutputFormat::Json => self.print_json(&item),
        }
    }

    /// Print a success message (suppressed in JSON mode)
    pub fn print_success(&self, message: &str) {
        if self.is_json() {
            return;
        }
        if self.colored {
            println!("{} {}", "✅".green(), message);
        } else {
            println!("✅ {}", message);
        }
    }

    /// Print a heading line (suppressed in JSON mode)
    pub fn print_info(&self, message: &str) {
        if self.is_json() {
            return;
        }
        if self.colored {
            println!("{}", message.bold());
        } else {
            println!("{}", message);
        }
    }

    fn print_table<T: Tabled>(&self, items: Vec<T>) -> Result<()> {
        if items.is_empty() {
            println!("No items found");
            return Ok(());
        }

        let mut table = Table::new(items);
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        println!("{}", table);
        Ok(())
    }

    /// Print any serializable value as pretty JSON
    pub fn print_json<T: Serialize>(&self, items: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(items)?;
        println!("{}", json);
        Ok(())
    }
}

/// Render bytes as text when they are UTF-8, hex otherwise
pub fn display_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|b| format!("{:02x}", b)).collect(),
    }
}
