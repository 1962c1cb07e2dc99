use crate::command::{parse_pressure, COMMAND_PREFIX};
use crate::error::CommandError;

const COMMENT_MARKER: char = '#';

/// Parse a simulated pressure profile into pressure values (Pa), in order.
///
/// One command per line in the form `CMD, <team>, SIMP, <pascals>`. Blank
/// lines and lines starting with `#` are skipped. The team field is a
/// placeholder; the sender substitutes its own team id.
pub fn parse_pressure_profile(text: &str) -> Result<Vec<u32>, CommandError> {
    let mut values = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }
        values.push(parse_profile_line(index + 1, line)?);
    }
    Ok(values)
}

fn parse_profile_line(line_no: usize, line: &str) -> Result<u32, CommandError> {
    let invalid = |reason: String| CommandError::InvalidProfileLine {
        line: line_no,
        reason,
    };

    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(invalid(format!("expected 4 fields, got {}", parts.len())));
    }
    if parts[0] != COMMAND_PREFIX {
        return Err(invalid(format!("expected {COMMAND_PREFIX}, got {:?}", parts[0])));
    }
    if !parts[2].eq_ignore_ascii_case("SIMP") {
        return Err(invalid(format!("expected SIMP, got {:?}", parts[2])));
    }
    parse_pressure("SIMP", parts[3]).map_err(|err| invalid(err.to_string()))
}
