//! JSON command log: one [`DrawCommand`] object per line.
//!
//! ```text
//! {"op":"pen_up"}
//! {"op":"move_to","x":-4.0,"y":0.0}
//! {"op":"pen_down"}
//! ```
//!
//! The format can be replayed into any agent after parsing with
//! [`from_json_lines`].

use penline_pipeline::DrawCommand;

/// Serialize one command as a single JSON line, without the newline.
///
/// # Errors
///
/// Returns the `serde_json` error if serialization fails.
pub fn to_json_line(command: &DrawCommand) -> Result<String, serde_json::Error> {
    serde_json::to_string(command)
}

/// Serialize commands as newline-terminated JSON lines.
///
/// # Errors
///
/// Returns the `serde_json` error if any command fails to serialize.
pub fn to_json_lines(commands: &[DrawCommand]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for command in commands {
        out.push_str(&to_json_line(command)?);
        out.push('\n');
    }
    Ok(out)
}

/// Parse a JSON-lines command log. Blank lines are skipped.
///
/// # Errors
///
/// Returns the `serde_json` error for the first malformed line.
pub fn from_json_lines(text: &str) -> Result<Vec<DrawCommand>, serde_json::Error> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str)
        .collect()
}
