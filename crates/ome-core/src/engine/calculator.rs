//! Drug/route/dose → oral morphine equivalent.

use crate::models::{ConversionQuery, DoseUnit, MedicationOme, Ome, RegimenOme, UnitClass};
use crate::table::{ConversionTable, Normalizer};

use super::{ConversionError, EngineResult};

/// Computes OME values against a reference table.
pub struct OmeCalculator<'a> {
    table: &'a ConversionTable,
    normalizer: &'static Normalizer,
}

impl<'a> OmeCalculator<'a> {
    pub fn new(table: &'a ConversionTable) -> Self {
        Self {
            table,
            normalizer: Normalizer::shared(),
        }
    }

    /// OME of a single order, in mg oral morphine per 24 hours.
    pub fn to_ome(&self, query: &ConversionQuery) -> EngineResult<Ome> {
        let medication = self.medication_ome(query)?;
        Ok(Ome::new(medication.ome, [medication.drug]))
    }

    /// OME of a single order with its daily dose breakdown.
    pub fn medication_ome(&self, query: &ConversionQuery) -> EngineResult<MedicationOme> {
        if query.dose.is_nan() || query.dose <= 0.0 {
            return Err(ConversionError::NonPositiveDose(query.dose));
        }
        if query.dose.is_infinite() {
            return Err(ConversionError::DoseOutOfRange(query.dose));
        }

        let entry = self.table.lookup(&query.drug, &query.route)?;

        let unit = self
            .normalizer
            .canonicalize_unit(&query.unit)
            .ok_or_else(|| ConversionError::UnknownUnit(query.unit.trim().to_string()))?;

        let scale = unit
            .scale_to(entry.unit)
            .ok_or_else(|| ConversionError::IncompatibleUnit {
                drug: entry.drug.clone(),
                route: entry.route.code().to_string(),
                expected: entry.unit,
                given: unit,
            })?;

        let administrations = self.administrations_per_day(query, unit)?;
        let daily_dose = query.dose * scale * f64::from(administrations);
        let ome = daily_dose * entry.potency_factor;
        if !(ome.is_finite() && ome > 0.0) {
            return Err(ConversionError::DoseOutOfRange(ome));
        }

        tracing::debug!(
            drug = %entry.drug,
            route = %entry.route,
            daily_dose,
            unit = %entry.unit,
            potency_factor = entry.potency_factor,
            ome,
            "Computed OME"
        );

        Ok(MedicationOme {
            drug: entry.drug.clone(),
            route: entry.route,
            daily_dose,
            unit: entry.unit,
            ome,
        })
    }

    /// Sum the OME of every medication in a regimen.
    ///
    /// Every medication must convert; the first failure is returned with its
    /// position in the regimen.
    pub fn regimen_ome(&self, queries: &[ConversionQuery]) -> EngineResult<RegimenOme> {
        if queries.is_empty() {
            return Err(ConversionError::EmptyRegimen);
        }

        let mut medications = Vec::with_capacity(queries.len());
        let mut total: Option<Ome> = None;

        for (index, query) in queries.iter().enumerate() {
            let medication = self.medication_ome(query).map_err(|e| ConversionError::Medication {
                index,
                source: Box::new(e),
            })?;

            let contribution = Ome::new(medication.ome, [medication.drug.as_str()]);
            total = Some(match total {
                Some(sum) => sum.merge(contribution),
                None => contribution,
            });
            medications.push(medication);
        }

        let total = total.ok_or(ConversionError::EmptyRegimen)?;
        if !total.value().is_finite() {
            return Err(ConversionError::DoseOutOfRange(total.value()));
        }
        tracing::debug!(medications = medications.len(), total = total.value(), "Computed regimen OME");

        Ok(RegimenOme { medications, total })
    }

    /// Administrations per 24 hours for a query.
    ///
    /// Rates and daily totals already describe a full day, so any frequency on
    /// them is validated but not applied.
    fn administrations_per_day(&self, query: &ConversionQuery, unit: DoseUnit) -> EngineResult<u32> {
        let frequency = match query.frequency.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                self.normalizer
                    .parse_frequency(raw)
                    .ok_or_else(|| ConversionError::UnknownFrequency(raw.to_string()))?,
            ),
        };

        if unit.class() == UnitClass::Rate || unit.is_daily_total() {
            if frequency.is_some() {
                tracing::debug!(unit = %unit, "Ignoring frequency for a 24-hour unit");
            }
            return Ok(1);
        }

        Ok(frequency.map_or(1, |f| f.administrations()))
    }
}
