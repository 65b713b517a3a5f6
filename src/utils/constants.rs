// src/utils/constants.rs

/// Raw `name` values that force a fixed `original` regardless of `merchant_name`.
pub const LITERAL_ORIGINAL_OVERRIDES: [(&str, &str); 2] = [
    ("KAYAK HANALEI", "KAYAK HANALEI"),
    ("Uber Eats", "UBER EATS"),
];

/// Comparison string used in place of an empty normalized key.
pub const NULL_SENTINEL: &str = "NULL";

/// Corporate suffix tokens, in the order they are stripped. Longer forms that
/// share a prefix with a shorter one must keep their relative position.
pub const CORPORATE_SUFFIXES: [&str; 16] = [
    "INC",
    "INCORPORATED",
    "CORPORATION",
    "CORP",
    "COMPANIES",
    "COMPANY",
    "CO",
    "LLC",
    "LIMITED",
    "LTD",
    "HOLDINGS",
    "HOLDING",
    "PLC",
    "PBC",
    "LP",
    "GROUP",
];

/// Conservative defaults. The fuzzy join scale is not comparable with the
/// string grouper cosine scale.
pub const DEFAULT_FUZZY_JOIN_THRESHOLD: f64 = 0.80;
pub const DEFAULT_STRING_GROUPER_THRESHOLD: f64 = 0.91;
/// Threshold carried for the unwired third algorithm.
pub const DEFAULT_NEAREST_NEIGHBOR_THRESHOLD: f64 = 0.61;

pub const TOKEN_SET_WEIGHT: f64 = 0.5;
pub const EDIT_DISTANCE_WEIGHT: f64 = 0.5;

pub const DEFAULT_NGRAM_SIZE: usize = 3;
pub const DEFAULT_DISCOVERY_FLOOR: f64 = 0.5;
pub const DEFAULT_MAX_MATCHES_PER_ROW: usize = 20;

/// Cell values treated as missing, matching the default NA markers of the
/// spreadsheet tooling the input files are exported from.
pub const MISSING_VALUE_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];
