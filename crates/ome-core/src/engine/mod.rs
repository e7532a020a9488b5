//! Conversion engine.
//!
//! Pipeline: ConversionQuery → OmeCalculator → Ome → TargetConverter → ConversionResult

mod calculator;
mod converter;

pub use calculator::*;
pub use converter::*;

use thiserror::Error;

use crate::config::{ConfigResult, EngineConfig};
use crate::models::{ConversionQuery, ConversionResult, DoseUnit, Ome, RegimenConversion, RegimenOme};
use crate::table::ConversionTable;

/// Per-request conversion errors. None of them are retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("unsupported drug/route combination: {drug} via {route}{}", hint(.suggestion))]
    UnknownDrugRoute {
        drug: String,
        route: String,
        suggestion: Option<String>,
    },

    #[error("incompatible unit for {drug} via {route}: expected {expected}, got {given}")]
    IncompatibleUnit {
        drug: String,
        route: String,
        expected: DoseUnit,
        given: DoseUnit,
    },

    #[error("unrecognized dose unit: {0}")]
    UnknownUnit(String),

    #[error("dose must be a positive number, got {0}")]
    NonPositiveDose(f64),

    #[error("computed dose is outside the representable range: {0}")]
    DoseOutOfRange(f64),

    #[error("unrecognized dosing frequency: {0}")]
    UnknownFrequency(String),

    #[error("regimen has no medications")]
    EmptyRegimen,

    #[error("medication at position {index}: {source}")]
    Medication {
        index: usize,
        source: Box<ConversionError>,
    },
}

fn hint(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" ({})", s))
        .unwrap_or_default()
}

pub type EngineResult<T> = Result<T, ConversionError>;

/// Engine that coordinates the OME calculation and target conversion.
pub struct ConversionEngine<'a> {
    calculator: OmeCalculator<'a>,
    converter: TargetConverter<'a>,
}

impl<'a> ConversionEngine<'a> {
    /// Create an engine over `table` with the safety settings from `config`.
    pub fn new(table: &'a ConversionTable, config: &EngineConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            calculator: OmeCalculator::new(table),
            converter: TargetConverter::new(table, config.safety.default_retained_fraction),
        })
    }

    /// OME of a single order.
    pub fn to_ome(&self, query: &ConversionQuery) -> EngineResult<Ome> {
        self.calculator.to_ome(query)
    }

    /// Equivalent dose of a target drug/route for an OME value.
    pub fn from_ome(
        &self,
        ome: &Ome,
        target_drug: &str,
        target_route: &str,
    ) -> EngineResult<ConversionResult> {
        self.converter.from_ome(ome, target_drug, target_route)
    }

    /// Convert a single order straight to the target.
    pub fn convert(
        &self,
        query: &ConversionQuery,
        target_drug: &str,
        target_route: &str,
    ) -> EngineResult<ConversionResult> {
        let ome = self.to_ome(query)?;
        self.from_ome(&ome, target_drug, target_route)
    }

    /// OME breakdown of a regimen.
    pub fn regimen_ome(&self, queries: &[ConversionQuery]) -> EngineResult<RegimenOme> {
        self.calculator.regimen_ome(queries)
    }

    /// Convert a whole regimen's total OME to the target.
    pub fn convert_regimen(
        &self,
        queries: &[ConversionQuery],
        target_drug: &str,
        target_route: &str,
    ) -> EngineResult<RegimenConversion> {
        let regimen = self.regimen_ome(queries)?;
        let result = self.from_ome(&regimen.total, target_drug, target_route)?;
        Ok(RegimenConversion {
            medications: regimen.medications,
            result,
        })
    }
}
