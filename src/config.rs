use serde::{Deserialize, Serialize};

/// Numeric knobs of the crossing validation and its fixes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// An edge endpoint this close to the crossing point is reused as the junction.
    pub merge_threshold_m: f64,
    /// Shortest edge a structure fix is allowed to leave behind.
    pub min_edge_length_m: f64,
    pub structure_padding_m: f64,
    pub structure_min_length_m: f64,
    pub structure_max_length_m: f64,
    /// Used when neither `width` nor an implied width is known.
    pub structure_fallback_length_m: f64,
    pub curb_offset_m: f64,
    /// Decimal places of the crossing point kept in an issue hash.
    pub hash_precision: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            merge_threshold_m: 0.75,
            min_edge_length_m: 0.55,
            structure_padding_m: 4.0,
            structure_min_length_m: 4.0,
            structure_max_length_m: 50.0,
            structure_fallback_length_m: 8.0,
            curb_offset_m: 1.0,
            hash_precision: 4,
        }
    }
}

impl ValidationConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ValidationConfig::from_json(r#"{"curb_offset_m": 2.5}"#).unwrap();
        assert_eq!(config.curb_offset_m, 2.5);
        assert_eq!(config.merge_threshold_m, 0.75);
        assert_eq!(config.structure_max_length_m, 50.0);
    }
}
