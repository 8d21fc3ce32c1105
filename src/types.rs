/// Identifier for a content category with its own schema and pool.
/// Examples: `daily`, `love`, `compatibility`
pub type CategoryId = String;
/// Name of one personalization dimension within a schema.
/// Examples: `ageGroup`, `zodiac`, `mood`
pub type DimensionName = String;
/// One discrete allowed value for a dimension.
/// Examples: `20s`, `rat`, `fire`
pub type DimensionValue = String;
/// Canonical hash identifying a cohort (64 lowercase hex chars).
/// Example: `56f24e8c9fe2aa2dcf2e2d1a261fcfa976a37dbd6a0c4c9a50ce47b2b319ddcf`
pub type CohortKey = String;
/// Literal marker left unresolved inside generated documents.
/// Examples: `{{userName}}`, `{{age}}`
pub type PlaceholderToken = String;
/// Unique identifier for one pool entry.
/// Example: `67e55044-10b1-426f-9247-bb680e5fe0c8`
pub type EntryId = String;
