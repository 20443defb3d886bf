/// P(fake) at or above which a posting is classified as fake.
pub const CLASSIFICATION_THRESHOLD: f64 = 0.5;

/// Coefficient magnitude a word must exceed to be reported as a flag.
/// Fixed, not learned.
pub const FLAG_THRESHOLD: f64 = 0.5;

/// Maximum number of red or green flags reported per posting.
pub const MAX_FLAGS: usize = 10;
