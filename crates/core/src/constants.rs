//! Constants used throughout the scout core crate.
//!
//! Defaults for segmentation, extraction and scoring live here so the raw-text convention and the
//! rubric can be read in one place.

/// Token separating one candidate from the next in a raw batch.
pub const DEFAULT_DELIMITER: &str = "|||";

/// Fragments whose trimmed length (in characters) is below this are discarded as noise.
pub const DEFAULT_MIN_FRAGMENT_LEN: usize = 30;

/// Name used when a fragment has no `###` header line.
pub const DEFAULT_NAME: &str = "Expert";

/// Category used when a fragment has no `TYPE:` line.
pub const DEFAULT_CATEGORY: &str = "Innovator";

/// Identifier used when a fragment has no `NPI:` line.
pub const DEFAULT_IDENTIFIER: &str = "Pending Verification";

/// Starting point for the keyword rubric.
pub const RUBRIC_BASE_SCORE: u8 = 50;

/// Keyword → points table for the rubric. Matching is case-insensitive substring search and each
/// keyword counts at most once per fragment.
pub const RUBRIC_KEYWORDS: &[(&str, u8)] = &[
    ("keynote", 15),
    ("ted", 20),
    ("podcast", 10),
    ("bestselling", 10),
    ("million", 10),
    ("followers", 5),
    ("chief", 10),
    ("president", 10),
    ("founder", 10),
    ("professor", 5),
];

/// Lower bound (inclusive) of the Platinum band.
pub const PLATINUM_THRESHOLD: u8 = 90;

/// Lower bound (inclusive) of the Gold band.
pub const GOLD_THRESHOLD: u8 = 75;

/// Score assigned when delegated scoring cannot produce a number.
pub const DEFAULT_FALLBACK_SCORE: u8 = 85;

/// Default bound on a single text-generation call, in seconds.
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 30;

/// Default bound on a single durable-backend append, in seconds.
pub const DEFAULT_COMMIT_TIMEOUT_SECS: u64 = 15;

/// Default CSV file used as the durable backend when no sheet URL is configured.
pub const DEFAULT_SHEET_PATH: &str = "scout_sheet.csv";

/// Default Gemini model for generation.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Default Gemini REST base URL.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
