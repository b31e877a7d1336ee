//! Log formatting and output with ANSI colors
//!
//! Handles:
//! - Colorized console output with tag and level formatting
//! - Dual output (console + file)
//! - Broken pipe handling for piped commands

use super::file::write_to_file;
use super::levels::LogLevel;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::{stderr, stdout, ErrorKind, Write};

/// Log format widths for alignment
const TAG_WIDTH: usize = 9;
const LEVEL_WIDTH: usize = 7;

/// Format and output a log message
pub fn format_and_log(tag: LogTag, level: LogLevel, message: &str) {
    let now = Local::now();
    let time = now.format("%H:%M:%S").to_string();

    let console_line = format!(
        "{} [{}] [{}] {}",
        time.dimmed(),
        format_tag(&tag),
        format_level(level),
        message
    );

    // Warnings and errors go to stderr so reports on stdout stay pipeable
    if level <= LogLevel::Warning {
        print_safe(&mut stderr(), &console_line);
    } else {
        print_safe(&mut stdout(), &console_line);
    }

    let file_line = format!(
        "{} [{}] [{}] {}",
        now.format("%Y-%m-%d %H:%M:%S"),
        tag.to_plain_string(),
        level.as_str(),
        message
    );
    write_to_file(&file_line);
}

/// Format a tag with appropriate color
fn format_tag(tag: &LogTag) -> ColoredString {
    let label = format!("{:<width$}", tag.to_plain_string(), width = TAG_WIDTH);
    match tag {
        LogTag::System => label.bright_yellow().bold(),
        LogTag::Config => label.bright_white().bold(),
        LogTag::Cache => label.bright_blue().bold(),
        LogTag::Rpc => label.bright_green().bold(),
        LogTag::Holders => label.bright_cyan().bold(),
        LogTag::Metadata => label.bright_magenta().bold(),
        LogTag::OffChain => label.magenta().bold(),
        LogTag::Enrich => label.cyan().bold(),
        LogTag::Report => label.green().bold(),
    }
}

/// Format level with appropriate color
fn format_level(level: LogLevel) -> ColoredString {
    let label = format!("{:<width$}", level.as_str(), width = LEVEL_WIDTH);
    match level {
        LogLevel::Error => label.bright_red().bold(),
        LogLevel::Warning => label.yellow().bold(),
        LogLevel::Info => label.white().bold(),
        LogLevel::Debug | LogLevel::Verbose => label.dimmed(),
    }
}

/// Print a line but exit quietly on broken pipes
fn print_safe<W: Write>(out: &mut W, message: &str) {
    if let Err(e) = writeln!(out, "{}", message) {
        if e.kind() == ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
    }
    let _ = out.flush();
}
