//! Oral morphine equivalent → target drug/route dose.

use crate::models::{ConversionResult, Ome};
use crate::table::ConversionTable;

use super::{ConversionError, EngineResult};

/// Converts OME values into a dose of a target drug on a target route.
pub struct TargetConverter<'a> {
    table: &'a ConversionTable,
    default_retained_fraction: f64,
}

impl<'a> TargetConverter<'a> {
    /// `default_retained_fraction` must be in (0, 1); see `SafetyConfig`.
    pub fn new(table: &'a ConversionTable, default_retained_fraction: f64) -> Self {
        Self {
            table,
            default_retained_fraction,
        }
    }

    /// Equivalent 24-hour dose of `target_drug` via `target_route`.
    pub fn from_ome(
        &self,
        ome: &Ome,
        target_drug: &str,
        target_route: &str,
    ) -> EngineResult<ConversionResult> {
        let value = ome.value();
        if value.is_nan() || value <= 0.0 {
            return Err(ConversionError::NonPositiveDose(value));
        }
        if value.is_infinite() {
            return Err(ConversionError::DoseOutOfRange(value));
        }

        let entry = self.table.lookup(target_drug, target_route)?;

        let raw_target_dose = value / entry.potency_factor;
        let safety_factor = self.safety_factor(ome, &entry.drug);
        let reduced = raw_target_dose * safety_factor;
        if !(reduced.is_finite() && reduced > 0.0) {
            return Err(ConversionError::DoseOutOfRange(reduced));
        }

        let rounded = round_to_increment(reduced, entry.rounding_increment);
        let target_dose = if rounded > 0.0 {
            rounded
        } else {
            tracing::warn!(
                drug = %entry.drug,
                route = %entry.route,
                dose = reduced,
                increment = entry.rounding_increment,
                "Dose is below half a rounding increment, reporting unrounded value"
            );
            reduced
        };

        tracing::debug!(
            ome = ome.value(),
            target_drug = %entry.drug,
            target_route = %entry.route,
            raw_target_dose,
            safety_factor,
            target_dose,
            "Converted from OME"
        );

        Ok(ConversionResult {
            ome_value: ome.value(),
            source_drugs: ome.source_drugs().map(String::from).collect(),
            target_drug: entry.drug.clone(),
            target_route: entry.route,
            raw_target_dose,
            target_dose,
            target_unit: entry.unit,
            safety_factor_applied: safety_factor,
            rounding_increment: entry.rounding_increment,
        })
    }

    /// Fraction of the calculated dose retained when converting `ome` to
    /// `target_drug` (canonical name).
    ///
    /// A route-only change keeps 1.0. A switch applies the lowest retained
    /// fraction over all switched source drugs. An OME with no recorded
    /// source counts as a switch.
    pub fn safety_factor(&self, ome: &Ome, target_drug: &str) -> f64 {
        if ome.is_only(target_drug) {
            return 1.0;
        }

        ome.source_drugs()
            .filter(|source| *source != target_drug)
            .map(|source| self.retained_fraction(source, target_drug))
            .reduce(f64::min)
            .unwrap_or(self.default_retained_fraction)
    }

    /// Retained fraction for a single drug switch.
    ///
    /// Resolution order:
    /// 1. per-pair override from the reference data
    /// 2. the configured global default
    pub fn retained_fraction(&self, from_drug: &str, to_drug: &str) -> f64 {
        match self.table.safety_override(from_drug, to_drug) {
            Some(rule) => rule.retained_fraction,
            None => self.default_retained_fraction,
        }
    }
}

/// Round to the nearest multiple of `increment`, trimming float noise.
///
/// Values too large to round or trim come back unchanged or untrimmed.
pub fn round_to_increment(value: f64, increment: f64) -> f64 {
    let rounded = (value / increment).round() * increment;
    if !rounded.is_finite() {
        return value;
    }
    let scaled = rounded * 1e6;
    if !scaled.is_finite() {
        return rounded;
    }
    scaled.round() / 1e6
}
