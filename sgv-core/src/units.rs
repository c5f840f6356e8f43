//! Glucose unit conversion.

/// mg/dL per mmol/L used for conversion.
pub const MGDL_PER_MMOL: f64 = 18.0;

/// Convert a mmol/L value to whole mg/dL.
pub fn mmol_to_mgdl(mmol: f64) -> f64 {
    (mmol * MGDL_PER_MMOL).round()
}
