// 🏘️ Colony - the output entity of the importer
//
// Append-only: rows are created exclusively by the import pipeline.
// name is upper-cased, postal_code is exactly 5 digits (zero-padded).

use serde::{Deserialize, Serialize};

use crate::error::{ImportError, Result};

/// Width of the colony name column in the store
pub const MAX_COLONY_NAME_CHARS: usize = 255;

/// A resolved colony row waiting to be written (id assigned by the sink)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewColony {
    pub municipality_id: i64,
    pub name: String,
    pub postal_code: String,
}

impl NewColony {
    /// Build a colony row, enforcing the stored representation
    ///
    /// Fails only when the row cannot be stored at all; the caller counts
    /// that as a per-row error and moves on.
    pub fn new(municipality_id: i64, name: &str, postal_code: &str) -> Result<Self> {
        let name = name.trim().to_uppercase();
        if name.chars().count() > MAX_COLONY_NAME_CHARS {
            return Err(ImportError::InvalidColony(format!(
                "name exceeds {} characters: {}...",
                MAX_COLONY_NAME_CHARS,
                name.chars().take(40).collect::<String>()
            )));
        }

        let postal_code = format!("{:0>5}", postal_code.trim());
        if postal_code.len() != 5 || !postal_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ImportError::InvalidColony(format!(
                "postal code is not 5 digits: {}",
                postal_code
            )));
        }

        Ok(NewColony {
            municipality_id,
            name,
            postal_code,
        })
    }
}

/// A colony as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colony {
    pub id: i64,
    pub municipality_id: i64,
    pub name: String,
    pub postal_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_colony_upper_cases_and_pads() {
        let colony = NewColony::new(7, " Centro ", "6000").unwrap();

        assert_eq!(colony.municipality_id, 7);
        assert_eq!(colony.name, "CENTRO");
        assert_eq!(colony.postal_code, "06000");
    }

    #[test]
    fn test_new_colony_rejects_long_name() {
        let long_name = "A".repeat(MAX_COLONY_NAME_CHARS + 1);
        let result = NewColony::new(1, &long_name, "01000");

        assert!(matches!(result, Err(ImportError::InvalidColony(_))));
    }

    #[test]
    fn test_new_colony_rejects_bad_postal_code() {
        assert!(NewColony::new(1, "CENTRO", "123456").is_err());
        assert!(NewColony::new(1, "CENTRO", "12a45").is_err());
    }

    #[test]
    fn test_new_colony_name_limit_counts_chars_not_bytes() {
        // 255 accented chars = 510 bytes, still fits the column
        let name = "Ñ".repeat(MAX_COLONY_NAME_CHARS);
        assert!(NewColony::new(1, &name, "01000").is_ok());
    }
}
