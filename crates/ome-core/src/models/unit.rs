//! Dosing units and frequencies.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dosing unit attached to a query or a reference entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DoseUnit {
    #[serde(rename = "mg")]
    Mg,
    #[serde(rename = "mcg")]
    Mcg,
    #[serde(rename = "mg/hr")]
    MgPerHour,
    #[serde(rename = "mcg/hr")]
    McgPerHour,
    #[serde(rename = "mg/day")]
    MgPerDay,
    #[serde(rename = "mcg/day")]
    McgPerDay,
}

/// Whether a unit measures an amount or a continuous delivery rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitClass {
    Mass,
    Rate,
}

impl DoseUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            DoseUnit::Mg => "mg",
            DoseUnit::Mcg => "mcg",
            DoseUnit::MgPerHour => "mg/hr",
            DoseUnit::McgPerHour => "mcg/hr",
            DoseUnit::MgPerDay => "mg/day",
            DoseUnit::McgPerDay => "mcg/day",
        }
    }

    pub fn class(&self) -> UnitClass {
        match self {
            DoseUnit::MgPerHour | DoseUnit::McgPerHour => UnitClass::Rate,
            _ => UnitClass::Mass,
        }
    }

    /// A daily total (`mg/day`) is already a 24-hour amount.
    pub fn is_daily_total(&self) -> bool {
        matches!(self, DoseUnit::MgPerDay | DoseUnit::McgPerDay)
    }

    /// Micrograms per unit (per hour for rates).
    fn micrograms(&self) -> f64 {
        match self {
            DoseUnit::Mg | DoseUnit::MgPerHour | DoseUnit::MgPerDay => 1000.0,
            DoseUnit::Mcg | DoseUnit::McgPerHour | DoseUnit::McgPerDay => 1.0,
        }
    }

    /// Factor that converts an amount in `self` into `target`.
    ///
    /// Only linear mass scaling within one unit class is supported. Returns
    /// `None` when the classes differ (mass vs. rate).
    pub fn scale_to(&self, target: DoseUnit) -> Option<f64> {
        if self.class() != target.class() {
            return None;
        }
        Some(self.micrograms() / target.micrograms())
    }
}

impl fmt::Display for DoseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Dosing frequency as administrations per 24 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frequency {
    per_day: u32,
}

impl Frequency {
    pub fn per_day(per_day: u32) -> Option<Self> {
        (per_day > 0).then_some(Self { per_day })
    }

    /// Dosing every `hours` hours. The interval must divide the day evenly.
    pub fn every_hours(hours: u32) -> Option<Self> {
        if hours == 0 || hours > 24 || 24 % hours != 0 {
            return None;
        }
        Self::per_day(24 / hours)
    }

    pub fn administrations(&self) -> u32 {
        self.per_day
    }
}
