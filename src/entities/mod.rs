// Geographic catalog entities
//
// FederalEntity and Municipality are read-only reference data for a run.
// Colony rows are produced by the importer and appended to the store.

pub mod colony;
pub mod federal_entity;
pub mod municipality;

pub use colony::{Colony, NewColony, MAX_COLONY_NAME_CHARS};
pub use federal_entity::{federal_entities, pad_state_code, FederalEntity, FEDERAL_ENTITIES};
pub use municipality::{Municipality, MunicipalityRecord};
