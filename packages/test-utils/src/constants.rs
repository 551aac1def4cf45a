/// Identity used by most tests
pub const TEST_ADDRESS: &str = "0xb1b1e";
pub const OTHER_ADDRESS: &str = "0xc0ffee";

/// 2024-03-15 12:00:00 UTC, a Friday
pub const TEST_CLOCK_MS: u64 = 1_710_504_000_000;
/// Epoch day of `TEST_CLOCK_MS`
pub const TEST_EPOCH_DAY: u64 = 19_797;

pub const TEST_VERSE: &str = "John 3:16";
pub const TEST_DIGEST: &str = "8jNmKq3rGqY4tYk3Vn1bZ5wP2dCxHhQ7uR9sTfLa6eWm";
