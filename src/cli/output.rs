//! Colored terminal output for upload operations
//!
//! Provides consistent, colored CLI output with proper formatting

use std::io::Write;
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Output manager for consistent colored terminal output
///
/// Write failures to stdout are swallowed: progress reporting must never
/// fail the upload itself. Errors go to stderr.
#[derive(Debug)]
pub struct OutputManager {
    bufwtr: BufferWriter,
}

impl Clone for OutputManager {
    fn clone(&self) -> Self {
        Self {
            bufwtr: BufferWriter::stdout(ColorChoice::Auto),
        }
    }
}

impl Default for OutputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputManager {
    /// Create a new output manager
    pub fn new() -> Self {
        Self {
            bufwtr: BufferWriter::stdout(ColorChoice::Auto),
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        let mut buffer = self.bufwtr.buffer();
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)));
        let _ = write!(&mut buffer, "ℹ");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, " {}", message);
        let _ = self.bufwtr.print(&buffer);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        let mut buffer = self.bufwtr.buffer();
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
        let _ = write!(&mut buffer, "✓");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, " {}", message);
        let _ = self.bufwtr.print(&buffer);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        let mut buffer = self.bufwtr.buffer();
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
        let _ = write!(&mut buffer, "⚠");
        let _ = buffer.reset();
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
        let _ = writeln!(&mut buffer, " {}", message);
        let _ = buffer.reset();
        let _ = self.bufwtr.print(&buffer);
    }

    /// Print an error message to stderr (always shown)
    pub fn error(&self, message: &str) {
        let bufwtr = BufferWriter::stderr(ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();

        // Try colored output to stderr
        if buffer
            .set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))
            .is_err()
            || write!(&mut buffer, "✗").is_err()
            || buffer.reset().is_err()
            || buffer
                .set_color(ColorSpec::new().set_fg(Some(Color::Red)))
                .is_err()
            || writeln!(&mut buffer, " {}", message).is_err()
            || buffer.reset().is_err()
            || bufwtr.print(&buffer).is_err()
        {
            // Stderr failed - fallback to stdout as last resort
            println!("[STDERR ERROR] ✗ {}", message);
        }
    }

    /// Print indented text (for sub-items)
    pub fn indent(&self, message: &str) {
        let mut buffer = self.bufwtr.buffer();
        let _ = writeln!(&mut buffer, "    {}", message);
        let _ = self.bufwtr.print(&buffer);
    }

    /// Print a plain message
    pub fn println(&self, message: &str) {
        let mut buffer = self.bufwtr.buffer();
        let _ = writeln!(&mut buffer, "{}", message);
        let _ = self.bufwtr.print(&buffer);
    }
}
