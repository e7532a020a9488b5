//! OME values and conversion results.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{DoseUnit, Route};
use crate::table::normalize_drug;

/// Oral morphine equivalent in mg per 24 hours.
///
/// Carries the canonical names of the drugs it was computed from, so the
/// target side can tell a route change from a drug switch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ome {
    mg_per_day: f64,
    source_drugs: BTreeSet<String>,
}

impl Ome {
    /// Build an OME value from an externally computed number.
    pub fn new<I, S>(mg_per_day: f64, source_drugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            mg_per_day,
            source_drugs: source_drugs
                .into_iter()
                .map(|d| normalize_drug(d.as_ref()))
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// mg oral morphine per 24 hours.
    pub fn value(&self) -> f64 {
        self.mg_per_day
    }

    pub fn source_drugs(&self) -> impl Iterator<Item = &str> {
        self.source_drugs.iter().map(String::as_str)
    }

    /// True when every source is `drug` (a route-only change).
    ///
    /// An OME with no recorded source is never considered same-drug.
    pub fn is_only(&self, drug: &str) -> bool {
        !self.source_drugs.is_empty() && self.source_drugs.iter().all(|d| d == drug)
    }

    /// Add another OME contribution to this one.
    pub fn merge(mut self, other: Ome) -> Self {
        self.mg_per_day += other.mg_per_day;
        self.source_drugs.extend(other.source_drugs);
        self
    }
}

/// One medication's contribution to a regimen total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationOme {
    /// Canonical drug name
    pub drug: String,
    pub route: Route,
    /// 24-hour dose in the reference entry's unit (rate for rate entries)
    pub daily_dose: f64,
    /// Reference entry unit
    pub unit: DoseUnit,
    /// mg oral morphine per 24 hours
    pub ome: f64,
}

/// OME breakdown for a whole regimen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegimenOme {
    pub medications: Vec<MedicationOme>,
    pub total: Ome,
}

/// Equivalent dose of a target drug/route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversionResult {
    /// Source OME in mg oral morphine per 24 hours
    pub ome_value: f64,
    /// Canonical source drug names
    pub source_drugs: Vec<String>,
    /// Canonical target drug name
    pub target_drug: String,
    pub target_route: Route,
    /// `ome_value / potency_factor`, before reduction and rounding
    pub raw_target_dose: f64,
    /// Final 24-hour dose (rate for rate units)
    pub target_dose: f64,
    pub target_unit: DoseUnit,
    /// Fraction of the raw dose retained; 1.0 for a route-only change
    pub safety_factor_applied: f64,
    /// Increment the final dose was rounded to
    pub rounding_increment: f64,
}

impl ConversionResult {
    /// Whether a cross-tolerance reduction was applied.
    pub fn reduction_applied(&self) -> bool {
        self.safety_factor_applied < 1.0
    }
}

/// Conversion of a full regimen, with its per-medication breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegimenConversion {
    pub medications: Vec<MedicationOme>,
    pub result: ConversionResult,
}
