//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the Ledger Agents binaries.

use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the service banner
    pub fn banner(&self, title: &str) {
        if self.colored {
            println!(
                "\n   {} {}\n",
                title.bright_white().bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
            );
        } else {
            println!("\n   {} v{}\n", title, env!("CARGO_PKG_VERSION"));
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Print the user prompt and flush so input appears on the same line
    pub fn prompt(&self) {
        if self.colored {
            print!("\n{} ", "you ›".bright_cyan().bold());
        } else {
            print!("\nyou > ");
        }
        io::stdout().flush().ok();
    }

    /// Print a transient status line such as the thinking indicator
    pub fn status(&self, message: &str) {
        if self.colored {
            println!("{}", message.dimmed());
        } else {
            println!("{}", message);
        }
    }

    /// Print a message from the assistant
    pub fn assistant(&self, message: &str) {
        if self.colored {
            println!("\n{}\n{}", "assistant ›".bright_green().bold(), message);
        } else {
            println!("\nassistant > \n{}", message);
        }
    }

    /// Print newline
    pub fn newline(&self) {
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_new() {
        assert!(Output::new().colored);
        assert!(Output::default().colored);
        assert!(!Output::no_color().colored);
    }

    #[test]
    fn test_output_methods_no_panic() {
        for output in [Output::no_color(), Output::new()] {
            output.banner("Ledger Agents");
            output.info("test info");
            output.warning("test warning");
            output.error("test error");
            output.kv("key", "value");
            output.hint("hint message");
            output.prompt();
            output.status("🤔 Thinking...");
            output.assistant("Your checking balance is $1,200.00");
            output.newline();
        }
    }
}
