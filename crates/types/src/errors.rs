use thiserror::Error;

// ============================================================================
// Decode Errors
// ============================================================================

/// Failure to decode a claim record buffer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A field read would run past the end of the buffer
    #[error("Truncated record: need {needed} bytes at offset {offset}, buffer holds {len}")]
    TruncatedRecord {
        offset: usize,
        needed: usize,
        len: usize,
    },

    /// A length prefix does not fit the host or overflows 64 bits
    #[error("Malformed length at offset {offset}: {reason}")]
    MalformedLength { offset: usize, reason: String },
}

impl DecodeError {
    /// Create a truncation error for a read of `needed` bytes at `offset`
    pub fn truncated(offset: usize, needed: usize, len: usize) -> Self {
        Self::TruncatedRecord {
            offset,
            needed,
            len,
        }
    }

    /// Create a malformed length error
    pub fn malformed_length(offset: usize, reason: &str) -> Self {
        Self::MalformedLength {
            offset,
            reason: reason.to_string(),
        }
    }
}

// ============================================================================
// Calendar Errors
// ============================================================================

/// Failure to map between epoch days and Gregorian dates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// Month outside 1..=12
    #[error("Invalid month {month}: expected 1..=12")]
    InvalidMonth { month: u32 },

    /// Day-of-week outside 0..=6
    #[error("Invalid day of week {day_of_week}: expected 0..=6")]
    InvalidDayOfWeek { day_of_week: u8 },

    /// Value outside the representable calendar range
    #[error("Calendar value '{parameter}' out of range: {value}")]
    OutOfRange { parameter: String, value: String },
}

impl CalendarError {
    /// Create an out-of-range error
    pub fn out_of_range(parameter: &str, value: impl ToString) -> Self {
        Self::OutOfRange {
            parameter: parameter.to_string(),
            value: value.to_string(),
        }
    }
}

/// Result of a decode operation
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Result of a calendar conversion
pub type CalendarResult<T> = std::result::Result<T, CalendarError>;
