//! Core domain layer. No external I/O dependencies.
//!
//! Entities, the risk table and the valuation calculators live here. Dependencies flow inward.

pub mod comparables;
pub mod dcf;
pub mod entities;
pub mod errors;
pub mod limits;
pub mod sensitivity;
pub mod vc_method;

pub use entities::{
    ClinicalStage, ComparableCompany, IntermediateValue, MarketSnapshot, PROJECTION_YEARS,
    RevenueModel, STAGE_RISK_FACTORS, SensitivityGrid, StageImpact, ValuationInputs,
    ValuationMethod, ValuationResult, VcMethodInputs, YearProjection,
};
pub use errors::DomainError;
