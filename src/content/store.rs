use anyhow::Result;

/// A section is a flat field -> value mapping. Values are JSON so a field
/// can hold a plain string or a structured list (e.g. contact links).
/// Client and server agree out of band on the expected fields per section.
pub type SectionData = serde_json::Map<String, serde_json::Value>;

/// Whole-section persistence. Writes overwrite the entire section with no
/// versioning and no conflict detection: the last writer wins. The trait
/// seam exists so an optimistic-concurrency store (version stamps or
/// per-field patches) could replace this one without changing call sites.
pub trait ContentStore: Send + Sync {
    /// Returns the field mapping for `name`. A section that was never
    /// written is an empty mapping, not an error.
    fn read_section(&self, name: &str) -> Result<SectionData>;

    /// Replaces the whole section with `data`.
    fn write_section(&self, name: &str, data: &SectionData) -> Result<()>;

    /// Names of all sections that have at least one field.
    fn list_sections(&self) -> Result<Vec<String>>;
}
