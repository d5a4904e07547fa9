//! Domain validation errors.

/// Result type for domain validation.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Errors raised by domain validation, always before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Cadence value not recognised
    #[error("invalid cadence: {0}")]
    InvalidCadence(String),

    /// Due vector does not match the ISO week count of its year
    #[error("schedule for {year} must have {expected} weeks, got {actual}")]
    ScheduleLength {
        /// Schedule year
        year: i32,
        /// ISO weeks in that year
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// Week number outside `[1, WeeksInYear(year)]`
    #[error("week {week} is outside 1..={max} for {year}")]
    WeekOutOfRange {
        /// Offending week
        week: u32,
        /// Year the week was checked against
        year: i32,
        /// Last valid week of that year
        max: u32,
    },

    /// Cadence or registration date changed after schedules were generated
    #[error("asset {0} already has schedules; cadence and registration date are locked")]
    ScheduleLocked(String),

    /// Another asset already uses this code
    #[error("asset code already in use: {0}")]
    DuplicateCode(String),

    /// Asset lookup failed
    #[error("unknown asset: {0}")]
    UnknownAsset(String),
}
