use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const BUNDLED_NAMES: &str = include_str!("../assets/valid_names.json");

/// Names the tracker is willing to accept from recognized text.
///
/// Recognition of a location strip or species strip only reaches durable
/// state when the result is one of these names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValidityTables {
    #[serde(default)]
    pub locations: BTreeSet<String>,
    #[serde(default)]
    pub species: BTreeSet<String>,
}

impl ValidityTables {
    /// Create empty tables (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build tables from name lists.
    #[must_use]
    pub fn new<L, S>(locations: L, species: S) -> Self
    where
        L: IntoIterator,
        L::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            locations: locations.into_iter().map(Into::into).collect(),
            species: species.into_iter().map(Into::into).collect(),
        }
    }

    /// Load tables from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into validity tables.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Tables bundled with the crate (Sinnoh and Johto/Kanto locations,
    /// national dex species up to the fourth generation).
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled asset is malformed.
    pub fn load_bundled() -> Result<Self, serde_json::Error> {
        Self::from_json(BUNDLED_NAMES)
    }

    #[must_use]
    pub fn is_location(&self, name: &str) -> bool {
        self.locations.contains(name)
    }

    #[must_use]
    pub fn is_species(&self, name: &str) -> bool {
        self.species.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_from_json() {
        let json = r#"{
            "locations": ["Twinleaf Town", "Route 201"],
            "species": ["Starly", "Bidoof"]
        }"#;

        let tables = ValidityTables::from_json(json).unwrap();
        assert!(tables.is_location("Route 201"));
        assert!(tables.is_species("Bidoof"));
        assert!(!tables.is_species("Route 201"));
    }

    #[test]
    fn bundled_tables_cover_common_names() {
        let tables = ValidityTables::load_bundled().unwrap();
        assert!(tables.is_location("Twinleaf Town"));
        assert!(tables.is_location("Trainers’ School"));
        assert!(tables.is_species("Starly"));
        assert!(tables.is_species("Nidoran♀"));
        assert_eq!(tables.species.len(), 493);
    }
}
