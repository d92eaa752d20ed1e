use napi::Result as NapiResult;
use napi_derive::napi;

use chain_tax_core::{Catalog, CalculationConfig, RunDocument};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Takes a run document (`{ catalog, config }`) and returns the simulation
/// envelope as JSON.
#[napi]
pub fn simulate_trade_chain(input_json: String) -> NapiResult<String> {
    let doc: RunDocument = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        chain_tax_core::run_simulation(&doc.config, &doc.catalog).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Seeds a run document from catalog defaults. An empty catalog string uses
/// the built-in sample catalog.
#[napi]
pub fn seed_run_document(
    catalog_json: String,
    funder_id: String,
    retailer_id: String,
) -> NapiResult<String> {
    let catalog: Catalog = if catalog_json.trim().is_empty() {
        Catalog::sample()
    } else {
        serde_json::from_str(&catalog_json).map_err(to_napi_error)?
    };
    let config =
        CalculationConfig::seeded(&catalog, &funder_id, &retailer_id).map_err(to_napi_error)?;
    serde_json::to_string(&RunDocument { catalog, config }).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_structures(input_json: String) -> NapiResult<String> {
    let input: chain_tax_core::scenarios::ComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        chain_tax_core::scenarios::compare_structures(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn sensitivity(input_json: String) -> NapiResult<String> {
    let input: chain_tax_core::scenarios::SensitivityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = chain_tax_core::scenarios::run_sensitivity(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
