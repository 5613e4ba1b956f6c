//! Parsing and formatting for the server's `H:M:S` duration strings.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HmsError {
    #[error("expected H:M:S, got {0:?}")]
    Shape(String),
    #[error("invalid number {part:?} in {input:?}")]
    Number { input: String, part: String },
    #[error("duration {0:?} does not fit in seconds")]
    Overflow(String),
}

/// Converts `"01:02:03"` into `3723`. Hours may exceed 24. A fractional
/// seconds part (`"00:00:05.250"`) is truncated.
pub fn parse_hms(input: &str) -> Result<u64, HmsError> {
    let trimmed = input.trim();
    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() != 3 {
        return Err(HmsError::Shape(input.to_string()));
    }

    let number = |part: &str| -> Result<u64, HmsError> {
        let whole = part.split('.').next().unwrap_or(part);
        whole.parse::<u64>().map_err(|_| HmsError::Number {
            input: input.to_string(),
            part: part.to_string(),
        })
    };

    let hours = number(parts[0])?;
    let minutes = number(parts[1])?;
    let seconds = number(parts[2])?;
    hours
        .checked_mul(3600)
        .and_then(|total| total.checked_add(minutes.checked_mul(60)?))
        .and_then(|total| total.checked_add(seconds))
        .ok_or_else(|| HmsError::Overflow(input.to_string()))
}

/// Renders seconds as zero-padded `HH:MM:SS`.
pub fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
