// 🗺️ Federal Entity - the 32 states of the national catalog
//
// Reference data: created once, never mutated by the importer.
// Codes are the 2-digit INEGI keys used in column 7 of the postal catalog.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederalEntity {
    /// 2-character state code ("01".."32")
    pub code: String,

    /// Canonical name
    pub name: String,
}

impl FederalEntity {
    pub fn new(code: &str, name: &str) -> Self {
        FederalEntity {
            code: pad_state_code(code),
            name: name.to_string(),
        }
    }
}

/// Left-zero-pad a state code to 2 characters ("9" → "09")
pub fn pad_state_code(code: &str) -> String {
    format!("{:0>2}", code.trim())
}

/// Fixed table of federal entities (code, canonical name)
pub const FEDERAL_ENTITIES: [(&str, &str); 32] = [
    ("01", "Aguascalientes"),
    ("02", "Baja California"),
    ("03", "Baja California Sur"),
    ("04", "Campeche"),
    ("05", "Coahuila de Zaragoza"),
    ("06", "Colima"),
    ("07", "Chiapas"),
    ("08", "Chihuahua"),
    ("09", "Ciudad de México"),
    ("10", "Durango"),
    ("11", "Guanajuato"),
    ("12", "Guerrero"),
    ("13", "Hidalgo"),
    ("14", "Jalisco"),
    ("15", "México"),
    ("16", "Michoacán de Ocampo"),
    ("17", "Morelos"),
    ("18", "Nayarit"),
    ("19", "Nuevo León"),
    ("20", "Oaxaca"),
    ("21", "Puebla"),
    ("22", "Querétaro"),
    ("23", "Quintana Roo"),
    ("24", "San Luis Potosí"),
    ("25", "Sinaloa"),
    ("26", "Sonora"),
    ("27", "Tabasco"),
    ("28", "Tamaulipas"),
    ("29", "Tlaxcala"),
    ("30", "Veracruz de Ignacio de la Llave"),
    ("31", "Yucatán"),
    ("32", "Zacatecas"),
];

/// All federal entities as owned values
pub fn federal_entities() -> Vec<FederalEntity> {
    FEDERAL_ENTITIES
        .iter()
        .map(|(code, name)| FederalEntity::new(code, name))
        .collect()
}
