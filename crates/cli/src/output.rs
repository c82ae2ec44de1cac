//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use surge_engine::RiskLevel;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Parse a format name from the config file, ignoring case
    pub fn parse_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

/// Render rows with the shared table style
pub fn render_table<T: Tabled>(rows: impl IntoIterator<Item = T>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a surge estimate as a signed percentage increase
pub fn format_surge(percentage: f64) -> String {
    format!("+{:.1}%", percentage)
}

/// Color a risk tier by severity
pub fn color_risk(level: RiskLevel) -> String {
    let label = level.as_str();
    match level {
        RiskLevel::Low => label.green().to_string(),
        RiskLevel::Moderate => label.yellow().to_string(),
        RiskLevel::High => label.red().to_string(),
        RiskLevel::VeryHigh => label.red().bold().to_string(),
    }
}

/// Color confidence based on value
pub fn color_confidence(confidence: u8) -> String {
    let formatted = format!("{}%", confidence);
    if confidence >= 85 {
        formatted.green().to_string()
    } else if confidence >= 78 {
        formatted.yellow().to_string()
    } else {
        formatted.normal().to_string()
    }
}
