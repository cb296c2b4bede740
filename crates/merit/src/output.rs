// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal output helpers shared by the subcommands.

use std::io::IsTerminal;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Ok,
    Warn,
    Fail,
    Info,
}

/// Output mode resolved once from the global flags.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub color: bool,
}

impl Output {
    /// Colors only when stdout is a TTY and `--plain` is absent.
    pub fn detect(json: bool, plain: bool) -> Self {
        Self {
            json,
            color: !json && !plain && std::io::stdout().is_terminal(),
        }
    }

    pub fn json<T: Serialize>(&self, value: &T) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
        );
    }

    pub fn header(&self, title: &str) {
        println!();
        println!("  {title}");
        println!("  {}", "-".repeat(50));
    }

    pub fn line(&self, mark: Mark, text: &str) {
        println!("    {} {text}", self.marker(mark));
    }

    fn marker(&self, mark: Mark) -> String {
        if self.color {
            use colored::Colorize;
            match mark {
                Mark::Ok => "✓".green().to_string(),
                Mark::Warn => "!".yellow().to_string(),
                Mark::Fail => "✗".red().to_string(),
                Mark::Info => "·".dimmed().to_string(),
            }
        } else {
            match mark {
                Mark::Ok => "[OK]  ".to_string(),
                Mark::Warn => "[WARN]".to_string(),
                Mark::Fail => "[FAIL]".to_string(),
                Mark::Info => "      ".to_string(),
            }
        }
    }

    pub fn highlight(&self, text: &str) -> String {
        if self.color {
            use colored::Colorize;
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }
}
