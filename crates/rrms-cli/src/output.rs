//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable) with support for
//! validation reports and progress indicators.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rrms_schemas::{SpecError, ValidationError, ValidationErrors};
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use tracing::{debug, trace};

/// Trait for formatting output with specialized support for validation errors
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format every violation of a failed validation
    fn format_validation_errors(&self, errors: &ValidationErrors) -> Result<String>;

    /// Format the error returned by a top-level validation call
    fn format_spec_error(&self, error: &SpecError) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            OutputFormat::Human => {
                // For human format, use pretty JSON as fallback
                Ok(serde_json::to_string_pretty(value)?)
            }
        }
    }

    fn format_validation_errors(&self, errors: &ValidationErrors) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_validation_errors_human(errors)),
            _ => self.format(errors),
        }
    }

    fn format_spec_error(&self, error: &SpecError) -> Result<String> {
        match error {
            SpecError::Invalid(errors) => self.format_validation_errors(errors),
            fatal => match self {
                OutputFormat::Human => Ok(format!("❌ {}\n", fatal)),
                _ => self.format(&serde_json::json!({ "fatal": fatal.to_string() })),
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Info,
    Success,
    Warning,
    Error,
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool, progress: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: progress && !quiet && std::io::stderr().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    #[cfg(test)]
    pub fn with_writer(format: OutputFormat, use_color: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color,
            show_progress: false, // No progress bars with custom writers
            quiet: false,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);
        self.message(Tone::Info, message)
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        self.message(Tone::Success, message)
    }

    /// Write a warning message, shown even in quiet mode
    pub fn warning(&mut self, message: &str) -> Result<()> {
        self.message(Tone::Warning, message)
    }

    /// Write an error message, shown even in quiet mode
    pub fn error(&mut self, message: &str) -> Result<()> {
        self.message(Tone::Error, message)
    }

    fn message(&mut self, tone: Tone, message: &str) -> Result<()> {
        let muted = self.quiet && matches!(tone, Tone::Info | Tone::Success);
        if muted || self.format != OutputFormat::Human {
            return Ok(());
        }

        let line = match (tone, self.use_color) {
            (Tone::Info, true) => format!("{} {}", "ℹ".blue(), message),
            (Tone::Info, false) => format!("INFO: {}", message),
            (Tone::Success, true) => message.green().to_string(),
            (Tone::Success, false) => message.to_string(),
            (Tone::Warning, true) => message.yellow().to_string(),
            (Tone::Warning, false) => format!("WARNING: {}", message),
            (Tone::Error, true) => message.red().to_string(),
            (Tone::Error, false) => format!("ERROR: {}", message),
        };
        self.writeln(&line)
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if self.format == OutputFormat::Human {
            self.writeln("")?;
            if self.use_color {
                self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
            } else {
                self.writeln(&format!("=== {} ===", title))
            }
        } else {
            Ok(())
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        trace!("Outputting {} bytes of data", formatted.len());

        // YAML output already ends with a newline
        if formatted.ends_with('\n') {
            self.write(&formatted)
        } else {
            self.writeln(&formatted)
        }
    }

    /// Write the violations of a failed validation (human format only)
    pub fn spec_error(&mut self, error: &SpecError) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }
        let formatted = self.format.format_spec_error(error)?;
        self.write(&formatted)
    }

    /// Create a progress bar for long operations
    pub fn progress_bar(&self, length: u64, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new(length);
        pb.set_style(default_progress_style());
        pb.set_message(message.to_string());
        Some(pb)
    }
}

/// Helper function to create a progress bar style
pub fn default_progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// Format validation errors for human reading
fn format_validation_errors_human(errors: &ValidationErrors) -> String {
    let mut output = String::new();

    output.push_str(&format!("❌ Validation Failed - {} Error(s)\n\n", errors.len()));

    for (i, error) in errors.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, format_validation_error_human(error)));
    }

    output
}

/// Format a single validation error for human reading
fn format_validation_error_human(error: &ValidationError) -> String {
    let mut output = String::new();

    output.push_str(&format!("📍 Path: {}\n", error.path));
    output.push_str(&format!("   🏷️  Kind: {}\n", error.kind));
    output.push_str(&format!("   💬 Message: {}\n", error.message));

    if let Some(suggestion) = &error.suggestion {
        output.push_str(&format!("   💡 Did you mean: {}\n", suggestion));
    }

    output
}

#[cfg(test)]
mod tests {
    include!("output/tests.rs");
}
