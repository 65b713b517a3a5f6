// src/normalization/mod.rs
//
// Canonical comparison keys for registry company names and transaction names.
// The replacement table is an explicit ordered list; later rules see the output
// of earlier ones, so reordering it changes results.

use log::{debug, warn};
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::utils::constants::{CORPORATE_SUFFIXES, NULL_SENTINEL};

/// How corporate suffixes are located. `.COM` is only ever stripped at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SuffixAnchoring {
    /// Remove the suffix wherever it follows whitespace, including mid-string
    /// ("ACME INC #12" and also "X INCREDIBLE" -> "XREDIBLE").
    #[default]
    Anywhere,
    /// Remove the suffix only when it ends the string.
    Trailing,
}

#[derive(Debug, Clone)]
pub struct ReplacementRule {
    pattern: Regex,
    replacement: String,
}

impl ReplacementRule {
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.to_string(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    fn apply(&self, input: &str) -> String {
        self.pattern
            .replace_all(input, regex::NoExpand(&self.replacement))
            .into_owned()
    }
}

/// A normalized key. `None` when normalization left nothing behind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NormalizedKey(Option<String>);

impl NormalizedKey {
    pub fn new(value: String) -> Self {
        if value.is_empty() {
            NormalizedKey(None)
        } else {
            NormalizedKey(Some(value))
        }
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    /// The key text, empty for a null key.
    pub fn as_str(&self) -> &str {
        self.0.as_deref().unwrap_or("")
    }

    /// The key text for equality and grouping, with the `NULL` sentinel in
    /// place of an empty key.
    pub fn comparison_str(&self) -> &str {
        self.0.as_deref().unwrap_or(NULL_SENTINEL)
    }

    pub fn value(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.comparison_str())
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    rules: Vec<ReplacementRule>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_anchoring(SuffixAnchoring::default())
    }
}

impl Normalizer {
    pub fn new(rules: Vec<ReplacementRule>) -> Self {
        Self { rules }
    }

    pub fn from_anchoring(anchoring: SuffixAnchoring) -> Self {
        Self::new(Self::default_rules(anchoring))
    }

    /// The US corporate naming replacement table, in application order.
    pub fn default_rules(anchoring: SuffixAnchoring) -> Vec<ReplacementRule> {
        let anchor = match anchoring {
            SuffixAnchoring::Anywhere => "",
            SuffixAnchoring::Trailing => r"\s*$",
        };

        let mut table: Vec<(String, &str)> = vec![
            (regex::escape("W/D"), ""),
            (regex::escape(" AND"), " & "),
        ];
        for suffix in CORPORATE_SUFFIXES.iter() {
            table.push((format!(r"\s{}{}", regex::escape(suffix), anchor), ""));
        }
        table.push((r"\.COM\s*$".to_string(), ""));
        table.push((regex::escape("#"), ""));
        table.push((r"\d+".to_string(), ""));
        table.push((regex::escape("."), ""));
        table.push((regex::escape("GIFTCARD"), ""));
        table.push((regex::escape(","), ""));
        table.push((regex::escape("-"), ""));
        table.push((regex::escape("'"), ""));

        let mut rules = Vec::with_capacity(table.len());
        for (pattern, replacement) in &table {
            match ReplacementRule::new(pattern, replacement) {
                Ok(rule) => rules.push(rule),
                Err(e) => warn!("Invalid regex pattern: '{}'. Error: {}", pattern, e),
            }
        }
        rules
    }

    pub fn rules(&self) -> &[ReplacementRule] {
        &self.rules
    }

    /// Uppercase, apply the replacement table in order, trim. The table is
    /// reapplied until the key stops changing, so a deletion that exposes a new
    /// match ("A 1INC" -> "A INC") is also handled and the result is stable
    /// under renormalization.
    pub fn normalize(&self, input: &str) -> NormalizedKey {
        let mut current = input.to_uppercase();
        // Every changing pass shortens the string or removes letters.
        let max_passes = current.len() + 1;
        for _ in 0..max_passes {
            let next = self.single_pass(&current);
            if next == current {
                return NormalizedKey::new(current);
            }
            current = next;
        }
        debug!("Normalization of '{}' did not settle", input);
        NormalizedKey::new(current)
    }

    fn single_pass(&self, input: &str) -> String {
        let mut value = input.to_string();
        for rule in &self.rules {
            value = rule.apply(&value);
        }
        value.trim().to_string()
    }
}
