//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use nfvis_common::{Outcome, Report};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    /// Whether decorations meant for a human reader may be printed
    pub fn is_human(&self) -> bool {
        matches!(self, OutputFormat::Table | OutputFormat::Plain)
    }
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

impl TableDisplay for Report {
    fn headers() -> Vec<&'static str> {
        vec!["Kind", "Key", "State", "Outcome", "Changed", "Request", "Status"]
    }

    fn row(&self) -> Vec<String> {
        let outcome = if self.preview && !self.outcome.is_failed() {
            format!("{} (check)", outcome_label(&self.outcome))
        } else {
            outcome_label(&self.outcome)
        };
        let request = match (&self.method, &self.path) {
            (Some(method), Some(path)) => format!("{} {}", method, path),
            _ => "-".to_string(),
        };
        vec![
            self.kind.to_string(),
            self.key.clone(),
            self.state.to_string(),
            outcome,
            if self.changed_fields.is_empty() {
                "-".to_string()
            } else {
                self.changed_fields.join(", ")
            },
            request,
            self.status.map_or_else(|| "-".to_string(), |s| s.to_string()),
        ]
    }
}

fn outcome_label(outcome: &Outcome) -> String {
    let text = outcome.to_string();
    match outcome {
        Outcome::Created => text.green().to_string(),
        Outcome::Updated => text.yellow().to_string(),
        Outcome::Deleted => text.magenta().to_string(),
        Outcome::Unchanged => text.dimmed().to_string(),
        Outcome::Failed(_) => text.red().bold().to_string(),
    }
}

/// Print a single item
pub fn print_item<T: Serialize + TableDisplay>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(T::headers());
            table.add_row(item.row());

            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(item).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(item).unwrap_or_default());
        }
        OutputFormat::Plain => {
            let row = item.row();
            for (header, value) in T::headers().iter().zip(row.iter()) {
                println!("{}: {}", header, value);
            }
        }
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    eprintln!("⚠️  {}", message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("ℹ️  {}", message);
}
