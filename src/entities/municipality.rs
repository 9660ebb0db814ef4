// 🏛️ Municipality - immutable reference snapshot for a run
//
// Loaded once from the store before the import starts. The resolver indexes
// these by (state, name); nothing in the pipeline mutates them.

use serde::{Deserialize, Serialize};

use super::federal_entity::pad_state_code;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Municipality {
    pub id: i64,

    /// Owning federal entity (2-character code)
    pub state_code: String,

    /// Canonical name, may carry accents ("CUAUHTÉMOC")
    pub name: String,
}

impl Municipality {
    pub fn new(id: i64, state_code: &str, name: &str) -> Self {
        Municipality {
            id,
            state_code: pad_state_code(state_code),
            name: name.trim().to_string(),
        }
    }
}

/// One row of a municipality snapshot CSV (`id,state_code,name`)
///
/// `id` may be blank, in which case the store assigns one.
#[derive(Debug, Clone, Deserialize)]
pub struct MunicipalityRecord {
    #[serde(default)]
    pub id: Option<i64>,

    pub state_code: String,

    pub name: String,
}
