//! Input normalization at the table-lookup boundary.
//!
//! Handles:
//! - Drug name keys (case and whitespace folding)
//! - Route canonicalization (orally→po, subcutaneously→sc)
//! - Unit canonicalization (micrograms→mcg, mcg/h→mcg/hr)
//! - Frequency parsing (bid→2, every 6 hours→4)
//!
//! Every mapping here is exact. Spelling correction is never applied; the
//! closest known name is only ever offered as a suggestion in an error.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use strsim::jaro_winkler;

use crate::models::{DoseUnit, Frequency, Route};

/// Minimum similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.85;

static SHARED: Lazy<Normalizer> = Lazy::new(Normalizer::new);

/// Canonical lookup key for a drug name: trimmed, single-spaced, lowercase.
pub fn normalize_drug(name: &str) -> String {
    normalize_key(name)
}

fn normalize_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Closest candidate to `needle`, if any is similar enough.
pub fn suggest<'a, I>(needle: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .map(|c| (c, jaro_winkler(needle, c)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(c, _)| c.to_string())
}

/// Normalizer for route, unit and frequency strings.
pub struct Normalizer {
    /// Route spellings → closed route set
    routes: HashMap<String, Route>,
    /// Unit spellings → canonical unit
    units: HashMap<String, DoseUnit>,
    /// Frequency phrases → administrations per day
    frequencies: HashMap<String, u32>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Create a new normalizer with default mappings.
    pub fn new() -> Self {
        Self {
            routes: Self::default_routes(),
            units: Self::default_units(),
            frequencies: Self::default_frequencies(),
        }
    }

    /// Process-wide normalizer with the default mappings.
    pub fn shared() -> &'static Normalizer {
        &SHARED
    }

    /// Canonicalize a route of administration.
    pub fn canonicalize_route(&self, route: &str) -> Option<Route> {
        self.routes.get(&normalize_key(route)).copied()
    }

    /// Canonicalize a dose unit.
    pub fn canonicalize_unit(&self, unit: &str) -> Option<DoseUnit> {
        self.units.get(&normalize_key(unit)).copied()
    }

    /// Parse a dosing frequency.
    pub fn parse_frequency(&self, frequency: &str) -> Option<Frequency> {
        let key = normalize_key(frequency);
        if let Some(per_day) = self.frequencies.get(&key) {
            return Frequency::per_day(*per_day);
        }
        Self::interval_hours(&key).and_then(Frequency::every_hours)
    }

    /// Hours in "q4h", "q 4 h", "every 4 hours", "every 4 hrs".
    fn interval_hours(key: &str) -> Option<u32> {
        let compact: String = key.chars().filter(|c| !c.is_whitespace()).collect();
        let hours = if let Some(rest) = compact.strip_prefix("every") {
            ["hours", "hour", "hrs", "hr", "h"]
                .iter()
                .find_map(|suffix| rest.strip_suffix(suffix))?
        } else {
            compact.strip_prefix('q')?.strip_suffix('h')?
        };
        hours.parse().ok()
    }

    /// Default route spellings.
    fn default_routes() -> HashMap<String, Route> {
        let mut map = HashMap::new();

        for route in Route::ALL {
            map.insert(route.code().into(), route);
        }

        // Oral
        map.insert("oral".into(), Route::Oral);
        map.insert("orally".into(), Route::Oral);
        map.insert("by mouth".into(), Route::Oral);
        map.insert("per os".into(), Route::Oral);
        map.insert("p.o.".into(), Route::Oral);

        // Intravenous
        map.insert("intravenous".into(), Route::Intravenous);
        map.insert("intravenously".into(), Route::Intravenous);
        map.insert("i.v.".into(), Route::Intravenous);

        // Intramuscular
        map.insert("intramuscular".into(), Route::Intramuscular);
        map.insert("intramuscularly".into(), Route::Intramuscular);
        map.insert("i.m.".into(), Route::Intramuscular);

        // Subcutaneous
        map.insert("subcutaneous".into(), Route::Subcutaneous);
        map.insert("subcutaneously".into(), Route::Subcutaneous);
        map.insert("subcut".into(), Route::Subcutaneous);
        map.insert("subq".into(), Route::Subcutaneous);
        map.insert("sub-q".into(), Route::Subcutaneous);
        map.insert("sq".into(), Route::Subcutaneous);

        // Transdermal
        map.insert("td".into(), Route::Transdermal);
        map.insert("patch".into(), Route::Transdermal);
        map.insert("transdermally".into(), Route::Transdermal);

        // Buccal / sublingual
        map.insert("buccal".into(), Route::BuccalSublingual);
        map.insert("sublingual".into(), Route::BuccalSublingual);
        map.insert("sl".into(), Route::BuccalSublingual);

        // Rectal
        map.insert("pr".into(), Route::Rectal);
        map.insert("rectally".into(), Route::Rectal);
        map.insert("per rectum".into(), Route::Rectal);

        map
    }

    /// Default unit spellings.
    fn default_units() -> HashMap<String, DoseUnit> {
        let mut map = HashMap::new();

        // Mass
        map.insert("mg".into(), DoseUnit::Mg);
        map.insert("milligram".into(), DoseUnit::Mg);
        map.insert("milligrams".into(), DoseUnit::Mg);
        map.insert("mcg".into(), DoseUnit::Mcg);
        map.insert("µg".into(), DoseUnit::Mcg);
        map.insert("ug".into(), DoseUnit::Mcg);
        map.insert("microgram".into(), DoseUnit::Mcg);
        map.insert("micrograms".into(), DoseUnit::Mcg);

        // Daily totals
        map.insert("mg/day".into(), DoseUnit::MgPerDay);
        map.insert("mg/24h".into(), DoseUnit::MgPerDay);
        map.insert("mg/d".into(), DoseUnit::MgPerDay);
        map.insert("mcg/day".into(), DoseUnit::McgPerDay);
        map.insert("mcg/24h".into(), DoseUnit::McgPerDay);

        // Rates
        map.insert("mg/hr".into(), DoseUnit::MgPerHour);
        map.insert("mg/h".into(), DoseUnit::MgPerHour);
        map.insert("mg per hour".into(), DoseUnit::MgPerHour);
        map.insert("mcg/hr".into(), DoseUnit::McgPerHour);
        map.insert("mcg/h".into(), DoseUnit::McgPerHour);
        map.insert("µg/hr".into(), DoseUnit::McgPerHour);
        map.insert("µg/h".into(), DoseUnit::McgPerHour);
        map.insert("mcg per hour".into(), DoseUnit::McgPerHour);

        map
    }

    /// Default frequency phrases (administrations per 24h).
    fn default_frequencies() -> HashMap<String, u32> {
        let mut map = HashMap::new();

        map.insert("once daily".into(), 1);
        map.insert("daily".into(), 1);
        map.insert("qd".into(), 1);
        map.insert("twice daily".into(), 2);
        map.insert("bid".into(), 2);
        map.insert("three times daily".into(), 3);
        map.insert("tid".into(), 3);
        map.insert("four times daily".into(), 4);
        map.insert("qid".into(), 4);

        // As-needed orders count as a single administration per day
        map.insert("prn".into(), 1);
        map.insert("as needed".into(), 1);

        map
    }
}
