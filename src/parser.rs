// 🏗️ Record Parser - one pipe-delimited catalog line → typed record
//
// Catalog line layout (only 4 of the columns matter here):
//
//   0 d_codigo  | 1 d_asenta | 2 d_tipo_asenta | 3 D_mnpio | 4 d_estado |
//   5 d_ciudad  | 6 d_CP     | 7 c_estado      | 8 c_oficina | ... (≥14)
//
// Example:
//   "06000|Centro|Colonia|Cuauhtémoc|Ciudad de México|Ciudad de México|06001|09|06001||09|015|0001|Urbano"
//
// Malformed lines and empty required fields are NOT errors: they come back as
// ParseOutcome::Skip so the driver can count them and keep going.

use serde::{Deserialize, Serialize};

use crate::entities::pad_state_code;

/// Field separator of the catalog export
pub const DELIMITER: char = '|';

/// Minimum number of fields in a data line
pub const MIN_FIELDS: usize = 14;

const FIELD_POSTAL_CODE: usize = 0;
const FIELD_COLONY: usize = 1;
const FIELD_MUNICIPALITY: usize = 3;
const FIELD_STATE_CODE: usize = 7;

// ============================================================================
// CORE TYPES
// ============================================================================

/// A validated catalog record, ready for normalization and resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// 5 digits, zero-padded
    pub postal_code: String,

    /// Colony name as it appears in the file (trimmed)
    pub colony_name: String,

    /// Free-text municipality name (trimmed, accents as-is)
    pub municipality_name: String,

    /// 2-character state code, zero-padded
    pub state_code: String,
}

/// Required fields of a catalog record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequiredField {
    PostalCode,
    ColonyName,
    MunicipalityName,
}

impl RequiredField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredField::PostalCode => "postal code",
            RequiredField::ColonyName => "colony name",
            RequiredField::MunicipalityName => "municipality name",
        }
    }
}

/// Why a line was rejected before resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Fewer than MIN_FIELDS fields
    Malformed { fields: usize },

    /// A required field is empty after trimming
    MissingField(RequiredField),

    /// Postal code is not 1-5 ASCII digits
    InvalidPostalCode(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Valid(CatalogRecord),
    Skip(SkipReason),
}

// ============================================================================
// PARSING
// ============================================================================

/// Split a raw line on the pipe delimiter and validate it
pub fn parse_line(line: &str) -> ParseOutcome {
    let line = line.trim_end_matches(['\r', '\n']);
    let fields: Vec<&str> = line.split(DELIMITER).collect();
    parse_fields(&fields)
}

/// Validate already-split fields
pub fn parse_fields(fields: &[&str]) -> ParseOutcome {
    if fields.len() < MIN_FIELDS {
        return ParseOutcome::Skip(SkipReason::Malformed {
            fields: fields.len(),
        });
    }

    let postal_code = fields[FIELD_POSTAL_CODE].trim();
    let colony_name = fields[FIELD_COLONY].trim();
    let municipality_name = fields[FIELD_MUNICIPALITY].trim();
    let state_code = pad_state_code(fields[FIELD_STATE_CODE]);

    let required = [
        (postal_code, RequiredField::PostalCode),
        (colony_name, RequiredField::ColonyName),
        (municipality_name, RequiredField::MunicipalityName),
    ];
    if let Some((_, field)) = required.iter().find(|(value, _)| value.is_empty()) {
        return ParseOutcome::Skip(SkipReason::MissingField(*field));
    }

    let postal_code = match pad_postal_code(postal_code) {
        Some(code) => code,
        None => {
            return ParseOutcome::Skip(SkipReason::InvalidPostalCode(postal_code.to_string()))
        }
    };

    ParseOutcome::Valid(CatalogRecord {
        postal_code,
        colony_name: colony_name.to_string(),
        municipality_name: municipality_name.to_string(),
        state_code,
    })
}

/// "6000" → "06000"; None if not 1-5 ASCII digits
pub fn pad_postal_code(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.len() > 5 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{:0>5}", raw))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const CENTRO_LINE: &str = "06000|Centro|Colonia|Cuauhtémoc|Ciudad de México|Ciudad de México|06001|09|06001||09|015|0001|Urbano";

    #[test]
    fn test_parse_valid_line() {
        match parse_line(CENTRO_LINE) {
            ParseOutcome::Valid(record) => {
                assert_eq!(record.postal_code, "06000");
                assert_eq!(record.colony_name, "Centro");
                assert_eq!(record.municipality_name, "Cuauhtémoc");
                assert_eq!(record.state_code, "09");
            }
            other => panic!("expected valid record, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_pads_state_and_postal_code() {
        let line = "6000| Centro |Colonia| Cuauhtémoc |CDMX|CDMX|06001|9|06001||09|015|0001|Urbano";

        match parse_line(line) {
            ParseOutcome::Valid(record) => {
                assert_eq!(record.postal_code, "06000");
                assert_eq!(record.colony_name, "Centro");
                assert_eq!(record.municipality_name, "Cuauhtémoc");
                assert_eq!(record.state_code, "09");
            }
            other => panic!("expected valid record, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_strips_line_terminators() {
        let line = format!("{}\r\n", CENTRO_LINE);
        assert!(matches!(parse_line(&line), ParseOutcome::Valid(_)));
    }

    #[test]
    fn test_too_few_fields_is_malformed() {
        let line = "06000|Centro|Colonia|Cuauhtémoc|CDMX|CDMX|06001|09|06001|x";

        assert_eq!(
            parse_line(line),
            ParseOutcome::Skip(SkipReason::Malformed { fields: 10 })
        );
    }

    #[test]
    fn test_exactly_fourteen_fields_is_enough() {
        let fields = [
            "01000",
            "San Ángel",
            "",
            "Álvaro Obregón",
            "",
            "",
            "",
            "9",
            "",
            "",
            "",
            "",
            "",
            "",
        ];
        assert!(matches!(parse_fields(&fields), ParseOutcome::Valid(_)));
    }

    #[test]
    fn test_missing_required_fields() {
        let base = "06000|Centro|Colonia|Cuauhtémoc|CDMX|CDMX|06001|09|06001||09|015|0001|Urbano";

        let no_cp = base.replacen("06000", "  ", 1);
        assert_eq!(
            parse_line(&no_cp),
            ParseOutcome::Skip(SkipReason::MissingField(RequiredField::PostalCode))
        );

        let no_colony = base.replacen("Centro", "", 1);
        assert_eq!(
            parse_line(&no_colony),
            ParseOutcome::Skip(SkipReason::MissingField(RequiredField::ColonyName))
        );

        let no_municipality = base.replacen("Cuauhtémoc", " ", 1);
        assert_eq!(
            parse_line(&no_municipality),
            ParseOutcome::Skip(SkipReason::MissingField(RequiredField::MunicipalityName))
        );
    }

    #[test]
    fn test_required_field_names() {
        assert_eq!(RequiredField::PostalCode.as_str(), "postal code");
        assert_eq!(RequiredField::ColonyName.as_str(), "colony name");
        assert_eq!(RequiredField::MunicipalityName.as_str(), "municipality name");
    }

    #[test]
    fn test_header_line_is_rejected_as_invalid_postal_code() {
        let header = "d_codigo|d_asenta|d_tipo_asenta|D_mnpio|d_estado|d_ciudad|d_CP|c_estado|c_oficina|c_CP|c_tipo_asenta|c_mnpio|id_asenta_cpcons|d_zona|c_cve_ciudad";

        assert_eq!(
            parse_line(header),
            ParseOutcome::Skip(SkipReason::InvalidPostalCode("d_codigo".to_string()))
        );
    }

    #[test]
    fn test_pad_postal_code() {
        assert_eq!(pad_postal_code("1000"), Some("01000".to_string()));
        assert_eq!(pad_postal_code("99999"), Some("99999".to_string()));
        assert_eq!(pad_postal_code("123456"), None);
        assert_eq!(pad_postal_code("12a"), None);
        assert_eq!(pad_postal_code(""), None);
    }
}
