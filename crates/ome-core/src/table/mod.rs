//! Opioid potency reference table.
//!
//! The table is built once from a static dataset, validated, and then only
//! ever read. Any problem with the dataset is a [`TableError::CorruptTable`]
//! at load time; a table that loaded successfully never serves a
//! non-positive factor or an ambiguous `(drug, route)` pair.

mod normalizer;

pub use normalizer::*;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::engine::{ConversionError, EngineResult};
use crate::models::{DoseUnit, Route};

/// Reference dataset bundled with the crate.
pub const BUNDLED_DATASET: &str = include_str!("../../data/conversion_table.json");

static DEFAULT_TABLE: Lazy<Result<Arc<ConversionTable>, String>> = Lazy::new(|| {
    ConversionTable::bundled()
        .map(Arc::new)
        .map_err(|e| e.to_string())
});

/// Table loading errors. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Corrupt conversion table: {0}")]
    CorruptTable(String),

    #[error("Conversion table JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Conversion table IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TableResult<T> = Result<T, TableError>;

/// One row of reference data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrugRouteEntry {
    /// Canonical drug name
    pub drug: String,
    pub route: Route,
    /// Dosing unit the potency factor applies to
    pub unit: DoseUnit,
    /// mg oral morphine per 1 `unit` (per 24h of delivery for rate units)
    pub potency_factor: f64,
    /// Clinically meaningful dosing granularity in `unit`
    pub rounding_increment: f64,
    /// Where the factor comes from
    #[serde(default)]
    pub source: Option<String>,
}

/// Per-pair cross-tolerance reduction that replaces the global default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetyOverride {
    pub from_drug: String,
    pub to_drug: String,
    /// Fraction of the calculated dose retained, in (0, 1)
    pub retained_fraction: f64,
    #[serde(default)]
    pub source: Option<String>,
}

/// Serialized shape of the reference data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReferenceDataset {
    #[serde(default)]
    pub version: Option<String>,
    pub entries: Vec<DrugRouteEntry>,
    #[serde(default)]
    pub safety_overrides: Vec<SafetyOverride>,
}

/// Immutable, validated conversion table.
#[derive(Debug, Clone)]
pub struct ConversionTable {
    /// drug → route → entry
    entries: HashMap<String, BTreeMap<Route, DrugRouteEntry>>,
    /// (from_drug, to_drug) → retained fraction
    overrides: HashMap<(String, String), SafetyOverride>,
    version: Option<String>,
    digest: String,
}

/// Shared handle to the bundled table, built on first use.
pub fn default_table() -> TableResult<Arc<ConversionTable>> {
    DEFAULT_TABLE
        .as_ref()
        .map(Arc::clone)
        .map_err(|e| TableError::CorruptTable(e.clone()))
}

impl ConversionTable {
    /// Build the table from the bundled dataset.
    pub fn bundled() -> TableResult<Self> {
        Self::from_json(BUNDLED_DATASET)
    }

    /// Load a dataset file.
    pub fn load<P: AsRef<Path>>(path: P) -> TableResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let table = Self::from_json(&json)?;
        tracing::info!("Loaded conversion table from {:?}", path.as_ref());
        Ok(table)
    }

    /// Parse and validate a JSON dataset.
    pub fn from_json(json: &str) -> TableResult<Self> {
        let dataset: ReferenceDataset = serde_json::from_str(json)?;
        Self::from_dataset(dataset)
    }

    /// Validate a dataset and build the table.
    pub fn from_dataset(dataset: ReferenceDataset) -> TableResult<Self> {
        if dataset.entries.is_empty() {
            return Err(TableError::CorruptTable("dataset has no entries".into()));
        }

        let mut entries: HashMap<String, BTreeMap<Route, DrugRouteEntry>> = HashMap::new();
        for mut entry in dataset.entries {
            entry.drug = normalize_drug(&entry.drug);
            validate_entry(&entry)?;

            let routes = entries.entry(entry.drug.clone()).or_default();
            if routes.contains_key(&entry.route) {
                return Err(TableError::CorruptTable(format!(
                    "duplicate entry for {} via {}",
                    entry.drug, entry.route
                )));
            }
            routes.insert(entry.route, entry);
        }

        let mut overrides = HashMap::new();
        for mut rule in dataset.safety_overrides {
            rule.from_drug = normalize_drug(&rule.from_drug);
            rule.to_drug = normalize_drug(&rule.to_drug);
            validate_override(&rule, &entries)?;

            let key = (rule.from_drug.clone(), rule.to_drug.clone());
            if overrides.contains_key(&key) {
                return Err(TableError::CorruptTable(format!(
                    "duplicate safety override {} -> {}",
                    key.0, key.1
                )));
            }
            overrides.insert(key, rule);
        }

        let mut table = Self {
            entries,
            overrides,
            version: dataset.version,
            digest: String::new(),
        };
        table.digest = table.compute_digest()?;

        tracing::info!(
            entries = table.len(),
            overrides = table.overrides.len(),
            digest = %table.digest,
            "Conversion table ready"
        );
        Ok(table)
    }

    /// Look up a drug/route pair as written by the caller.
    pub fn lookup(&self, drug: &str, route: &str) -> EngineResult<&DrugRouteEntry> {
        let key = normalize_drug(drug);
        match Normalizer::shared().canonicalize_route(route) {
            Some(route) => self.lookup_route(&key, route),
            None => Err(self.unknown_drug_route(&key, route.trim())),
        }
    }

    /// Look up a drug on a route from the closed route set.
    pub fn lookup_route(&self, drug: &str, route: Route) -> EngineResult<&DrugRouteEntry> {
        let key = normalize_drug(drug);
        self.entries
            .get(&key)
            .and_then(|routes| routes.get(&route))
            .ok_or_else(|| self.unknown_drug_route(&key, route.code()))
    }

    /// Per-pair override for switching `from_drug` to `to_drug`, if any.
    pub fn safety_override(&self, from_drug: &str, to_drug: &str) -> Option<&SafetyOverride> {
        self.overrides
            .get(&(normalize_drug(from_drug), normalize_drug(to_drug)))
    }

    /// Whether any entry exists for `drug`.
    pub fn contains_drug(&self, drug: &str) -> bool {
        self.entries.contains_key(&normalize_drug(drug))
    }

    /// Known drug names, sorted.
    pub fn drugs(&self) -> Vec<&str> {
        let mut drugs: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        drugs.sort_unstable();
        drugs
    }

    /// Routes available for a drug.
    pub fn routes_for(&self, drug: &str) -> Vec<Route> {
        self.entries
            .get(&normalize_drug(drug))
            .map(|routes| routes.keys().copied().collect())
            .unwrap_or_default()
    }

    /// All entries, ordered by drug then route.
    pub fn entries(&self) -> Vec<&DrugRouteEntry> {
        let mut entries: Vec<&DrugRouteEntry> =
            self.entries.values().flat_map(|r| r.values()).collect();
        entries.sort_by(|a, b| (&a.drug, a.route).cmp(&(&b.drug, b.route)));
        entries
    }

    /// Number of `(drug, route)` entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dataset version label, if the dataset carried one.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// SHA-256 of the canonical (sorted) dataset.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    fn compute_digest(&self) -> TableResult<String> {
        let mut safety_overrides: Vec<SafetyOverride> = self.overrides.values().cloned().collect();
        safety_overrides.sort_by(|a, b| (&a.from_drug, &a.to_drug).cmp(&(&b.from_drug, &b.to_drug)));

        let canonical = ReferenceDataset {
            version: self.version.clone(),
            entries: self.entries().into_iter().cloned().collect(),
            safety_overrides,
        };
        Ok(hash_data(&serde_json::to_vec(&canonical)?))
    }

    fn unknown_drug_route(&self, drug: &str, route: &str) -> ConversionError {
        let suggestion = match self.entries.get(drug) {
            Some(routes) => Some(format!(
                "{} is available via {}",
                drug,
                routes.keys().map(Route::code).collect::<Vec<_>>().join(", ")
            )),
            None => suggest(drug, self.entries.keys().map(String::as_str))
                .map(|name| format!("did you mean {}?", name)),
        };

        ConversionError::UnknownDrugRoute {
            drug: drug.to_string(),
            route: route.to_string(),
            suggestion,
        }
    }
}

/// Compute SHA-256 hash of data.
pub fn hash_data(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn validate_entry(entry: &DrugRouteEntry) -> TableResult<()> {
    let row = || format!("{} via {}", entry.drug, entry.route);

    if entry.drug.is_empty() {
        return Err(TableError::CorruptTable("entry with empty drug name".into()));
    }
    if !(entry.potency_factor.is_finite() && entry.potency_factor > 0.0) {
        return Err(TableError::CorruptTable(format!(
            "non-positive potency factor {} for {}",
            entry.potency_factor,
            row()
        )));
    }
    if !(entry.rounding_increment.is_finite() && entry.rounding_increment > 0.0) {
        return Err(TableError::CorruptTable(format!(
            "non-positive rounding increment {} for {}",
            entry.rounding_increment,
            row()
        )));
    }
    if entry.unit.is_daily_total() {
        return Err(TableError::CorruptTable(format!(
            "entry unit must be a per-dose or per-hour unit, got {} for {}",
            entry.unit,
            row()
        )));
    }
    Ok(())
}

fn validate_override(
    rule: &SafetyOverride,
    entries: &HashMap<String, BTreeMap<Route, DrugRouteEntry>>,
) -> TableResult<()> {
    let pair = || format!("{} -> {}", rule.from_drug, rule.to_drug);

    for drug in [&rule.from_drug, &rule.to_drug] {
        if !entries.contains_key(drug) {
            return Err(TableError::CorruptTable(format!(
                "safety override {} names unknown drug {}",
                pair(),
                drug
            )));
        }
    }
    if rule.from_drug == rule.to_drug {
        return Err(TableError::CorruptTable(format!(
            "safety override {} is not a drug switch",
            pair()
        )));
    }
    if !(rule.retained_fraction.is_finite()
        && rule.retained_fraction > 0.0
        && rule.retained_fraction < 1.0)
    {
        return Err(TableError::CorruptTable(format!(
            "retained fraction {} for {} must be in (0, 1)",
            rule.retained_fraction,
            pair()
        )));
    }
    Ok(())
}
