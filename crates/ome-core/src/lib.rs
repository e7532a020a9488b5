//! OME Core Library
//!
//! Converts opioid orders into oral morphine equivalents (OME) and from OME
//! into an equivalent dose of a target drug and route.
//!
//! # Architecture
//!
//! ```text
//! Structured query (drug, route, dose, unit, frequency)
//!                         │
//!                         ▼
//!                ┌──────────────────┐      ┌─────────────────────┐
//!                │   OmeCalculator  │◄─────│   ConversionTable   │
//!                │ dose × potency   │      │ (immutable, shared) │
//!                └────────┬─────────┘      └──────────┬──────────┘
//!                         │ Ome (mg/24h + sources)    │
//!                         ▼                           │
//!                ┌──────────────────┐                 │
//!                │  TargetConverter │◄────────────────┘
//!                │ ÷ potency        │
//!                │ × retained frac  │
//!                │ round(increment) │
//!                └────────┬─────────┘
//!                         ▼
//!                 ConversionResult
//! ```
//!
//! # Core Principle
//!
//! **A drug switch is never reported without its reduction.** Every result
//! carries the retained fraction that was applied and the raw dose it was
//! applied to.
//!
//! # Modules
//!
//! - [`table`]: Reference table, lookup normalization, load-time validation
//! - [`engine`]: OME calculator and target converter
//! - [`models`]: Queries, OME values, results, audit records
//! - [`config`]: TOML engine configuration
//! - [`logging`]: tracing subscriber setup

pub mod config;
pub mod engine;
pub mod logging;
pub mod models;
pub mod table;

// Re-export commonly used types
pub use config::{ConfigError, EngineConfig, SafetyConfig, TableConfig};
pub use engine::{ConversionEngine, ConversionError, EngineResult, OmeCalculator, TargetConverter};
pub use models::{
    ConversionAudit, ConversionQuery, ConversionResult, DoseUnit, MedicationOme, Ome,
    RegimenConversion, RegimenOme, Route,
};
pub use table::{default_table, ConversionTable, DrugRouteEntry, TableError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::path::Path;
use std::sync::Arc;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum OmeError {
    #[error("Unsupported drug/route: {0}")]
    UnknownDrugRoute(String),

    #[error("Incompatible unit: {0}")]
    IncompatibleUnit(String),

    #[error("Non-positive dose: {0}")]
    NonPositiveDose(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Corrupt table: {0}")]
    CorruptTable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<ConversionError> for OmeError {
    fn from(e: ConversionError) -> Self {
        let message = e.to_string();
        match e {
            ConversionError::Medication { source, .. } => match OmeError::from(*source) {
                OmeError::UnknownDrugRoute(_) => OmeError::UnknownDrugRoute(message),
                OmeError::IncompatibleUnit(_) => OmeError::IncompatibleUnit(message),
                OmeError::NonPositiveDose(_) => OmeError::NonPositiveDose(message),
                _ => OmeError::InvalidInput(message),
            },
            ConversionError::UnknownDrugRoute { .. } => OmeError::UnknownDrugRoute(message),
            ConversionError::IncompatibleUnit { .. } | ConversionError::UnknownUnit(_) => {
                OmeError::IncompatibleUnit(message)
            }
            ConversionError::NonPositiveDose(_) => OmeError::NonPositiveDose(message),
            ConversionError::DoseOutOfRange(_)
            | ConversionError::UnknownFrequency(_)
            | ConversionError::EmptyRegimen => {
                OmeError::InvalidInput(message)
            }
        }
    }
}

impl From<TableError> for OmeError {
    fn from(e: TableError) -> Self {
        OmeError::CorruptTable(e.to_string())
    }
}

impl From<ConfigError> for OmeError {
    fn from(e: ConfigError) -> Self {
        OmeError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for OmeError {
    fn from(e: serde_json::Error) -> Self {
        OmeError::SerializationError(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open an engine over the bundled table with default settings.
#[uniffi::export]
pub fn open_default_engine() -> Result<Arc<OmeEngine>, OmeError> {
    OmeEngine::with_config(EngineConfig::default())
}

/// Open an engine configured from a TOML file.
#[uniffi::export]
pub fn open_engine(config_path: String) -> Result<Arc<OmeEngine>, OmeError> {
    let config = EngineConfig::load_from(Path::new(&config_path))?;
    OmeEngine::with_config(config)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe engine handle for FFI. Holds only read-only state.
#[derive(uniffi::Object)]
pub struct OmeEngine {
    table: Arc<ConversionTable>,
    config: EngineConfig,
}

impl OmeEngine {
    fn with_config(config: EngineConfig) -> Result<Arc<Self>, OmeError> {
        config.validate()?;
        let table = config.load_table()?;
        Ok(Arc::new(Self { table, config }))
    }

    fn engine(&self) -> Result<ConversionEngine<'_>, OmeError> {
        Ok(ConversionEngine::new(&self.table, &self.config)?)
    }
}

#[uniffi::export]
impl OmeEngine {
    /// Compute the OME of a single order.
    pub fn to_ome(&self, query: FfiConversionQuery) -> Result<FfiOme, OmeError> {
        let ome = self.engine()?.to_ome(&query.into())?;
        Ok(ome.into())
    }

    /// Convert an OME value to a target drug/route.
    pub fn from_ome(
        &self,
        ome: FfiOme,
        target_drug: String,
        target_route: String,
    ) -> Result<FfiConversionResult, OmeError> {
        let result = self
            .engine()?
            .from_ome(&ome.into(), &target_drug, &target_route)?;
        Ok(result.into())
    }

    /// Convert a single order to a target drug/route.
    pub fn convert(
        &self,
        query: FfiConversionQuery,
        target_drug: String,
        target_route: String,
    ) -> Result<FfiConversionResult, OmeError> {
        let result = self
            .engine()?
            .convert(&query.into(), &target_drug, &target_route)?;
        Ok(result.into())
    }

    /// Convert a regimen's total OME to a target drug/route.
    pub fn convert_regimen(
        &self,
        queries: Vec<FfiConversionQuery>,
        target_drug: String,
        target_route: String,
    ) -> Result<FfiRegimenConversion, OmeError> {
        let queries: Vec<ConversionQuery> = queries.into_iter().map(|q| q.into()).collect();
        let conversion = self
            .engine()?
            .convert_regimen(&queries, &target_drug, &target_route)?;
        Ok(conversion.into())
    }

    /// Convert a regimen and return the audit record as JSON.
    pub fn convert_regimen_audited(
        &self,
        queries: Vec<FfiConversionQuery>,
        target_drug: String,
        target_route: String,
    ) -> Result<String, OmeError> {
        let queries: Vec<ConversionQuery> = queries.into_iter().map(|q| q.into()).collect();
        let conversion = self
            .engine()?
            .convert_regimen(&queries, &target_drug, &target_route)?;
        let audit = ConversionAudit::new(self.table.digest(), queries, conversion);
        Ok(audit.to_json()?)
    }

    /// SHA-256 of the reference table in use.
    pub fn table_digest(&self) -> String {
        self.table.digest().to_string()
    }

    /// Known drug names.
    pub fn drugs(&self) -> Vec<String> {
        self.table.drugs().into_iter().map(String::from).collect()
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe conversion query.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConversionQuery {
    pub drug: String,
    pub route: String,
    pub dose: f64,
    pub unit: String,
    pub frequency: Option<String>,
}

impl From<FfiConversionQuery> for ConversionQuery {
    fn from(query: FfiConversionQuery) -> Self {
        ConversionQuery {
            drug: query.drug,
            route: query.route,
            dose: query.dose,
            unit: query.unit,
            frequency: query.frequency,
        }
    }
}

/// FFI-safe OME value.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOme {
    pub value: f64,
    pub source_drugs: Vec<String>,
}

impl From<Ome> for FfiOme {
    fn from(ome: Ome) -> Self {
        Self {
            value: ome.value(),
            source_drugs: ome.source_drugs().map(String::from).collect(),
        }
    }
}

impl From<FfiOme> for Ome {
    fn from(ome: FfiOme) -> Self {
        Ome::new(ome.value, ome.source_drugs)
    }
}

/// FFI-safe conversion result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConversionResult {
    pub ome_value: f64,
    pub source_drugs: Vec<String>,
    pub target_drug: String,
    pub target_route: String,
    pub raw_target_dose: f64,
    pub target_dose: f64,
    pub target_unit: String,
    pub safety_factor_applied: f64,
    pub rounding_increment: f64,
}

impl From<ConversionResult> for FfiConversionResult {
    fn from(result: ConversionResult) -> Self {
        Self {
            ome_value: result.ome_value,
            source_drugs: result.source_drugs,
            target_drug: result.target_drug,
            target_route: result.target_route.code().to_string(),
            raw_target_dose: result.raw_target_dose,
            target_dose: result.target_dose,
            target_unit: result.target_unit.symbol().to_string(),
            safety_factor_applied: result.safety_factor_applied,
            rounding_increment: result.rounding_increment,
        }
    }
}

/// FFI-safe per-medication OME.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicationOme {
    pub drug: String,
    pub route: String,
    pub daily_dose: f64,
    pub unit: String,
    pub ome: f64,
}

impl From<MedicationOme> for FfiMedicationOme {
    fn from(medication: MedicationOme) -> Self {
        Self {
            drug: medication.drug,
            route: medication.route.code().to_string(),
            daily_dose: medication.daily_dose,
            unit: medication.unit.symbol().to_string(),
            ome: medication.ome,
        }
    }
}

/// FFI-safe regimen conversion.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRegimenConversion {
    pub medications: Vec<FfiMedicationOme>,
    pub result: FfiConversionResult,
}

impl From<RegimenConversion> for FfiRegimenConversion {
    fn from(conversion: RegimenConversion) -> Self {
        Self {
            medications: conversion.medications.into_iter().map(|m| m.into()).collect(),
            result: conversion.result.into(),
        }
    }
}
