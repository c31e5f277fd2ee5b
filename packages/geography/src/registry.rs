//! Read-only table of known regions.
//!
//! The default table is compiled in from `regions/kenya_counties.toml`.
//! Other tables can be supplied as TOML text or as a list of regions.

use std::collections::BTreeMap;

use feedback_map_geography_models::{Region, RegistryTable};

use crate::RegistryError;

/// Upper bound on the number of regions a registry may hold. Hit testing
/// is a linear scan, which is only reasonable at this size.
pub const MAX_REGIONS: usize = 50;

const KENYA_COUNTIES_TOML: &str = include_str!("../regions/kenya_counties.toml");

/// Immutable lookup table from region name to [`Region`].
#[derive(Debug, Clone)]
pub struct RegionRegistry {
    id: String,
    name: String,
    regions: Vec<Region>,
    by_name: BTreeMap<String, usize>,
    by_lowercase_name: BTreeMap<String, usize>,
}

impl RegionRegistry {
    /// Returns the built-in registry of Kenya's 47 counties.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML table fails to parse or validate. Since
    /// it is a compile-time constant, a failure indicates a development
    /// error and is caught by the tests in this module.
    #[must_use]
    pub fn kenya() -> Self {
        Self::from_toml_str(KENYA_COUNTIES_TOML)
            .unwrap_or_else(|e| panic!("Failed to load embedded Kenya county registry: {e}"))
    }

    /// Parses and validates a registry table from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the TOML is malformed or the table
    /// fails validation (see [`Self::from_regions`]).
    pub fn from_toml_str(toml_str: &str) -> Result<Self, RegistryError> {
        let table: RegistryTable = toml::de::from_str(toml_str)?;
        Self::from_regions(table.id, table.name, table.regions)
    }

    /// Builds a registry from an explicit list of regions. Iteration order
    /// is the order given.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::TooManyRegions`] if more than [`MAX_REGIONS`]
    ///   are given
    /// * [`RegistryError::InvalidRegion`] for an empty name or an
    ///   out-of-range coordinate
    /// * [`RegistryError::DuplicateRegion`] if two regions share a name
    pub fn from_regions(
        id: impl Into<String>,
        name: impl Into<String>,
        regions: Vec<Region>,
    ) -> Result<Self, RegistryError> {
        if regions.len() > MAX_REGIONS {
            return Err(RegistryError::TooManyRegions {
                count: regions.len(),
                max: MAX_REGIONS,
            });
        }

        let mut by_name = BTreeMap::new();
        let mut by_lowercase_name = BTreeMap::new();

        for (idx, region) in regions.iter().enumerate() {
            if region.name.trim().is_empty() {
                return Err(RegistryError::InvalidRegion {
                    name: region.name.clone(),
                    message: "name is empty".to_string(),
                });
            }
            if !region.coordinate().is_valid() {
                return Err(RegistryError::InvalidRegion {
                    name: region.name.clone(),
                    message: format!("coordinate ({}, {}) out of range", region.lat, region.lng),
                });
            }
            if by_name.insert(region.name.clone(), idx).is_some() {
                return Err(RegistryError::DuplicateRegion {
                    name: region.name.clone(),
                });
            }
            by_lowercase_name
                .entry(region.name.to_lowercase())
                .or_insert(idx);
        }

        let registry = Self {
            id: id.into(),
            name: name.into(),
            regions,
            by_name,
            by_lowercase_name,
        };
        log::debug!(
            "Loaded region registry '{}' with {} regions",
            registry.id,
            registry.len()
        );
        Ok(registry)
    }

    /// Registry identifier (e.g. `"kenya_counties"`).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable registry name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a region by exact name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Region> {
        self.by_name.get(name).map(|&idx| &self.regions[idx])
    }

    /// Looks up a region by name, ignoring case. Useful for aggregation
    /// sources that do not preserve capitalization.
    #[must_use]
    pub fn lookup_ignore_case(&self, name: &str) -> Option<&Region> {
        self.lookup(name).or_else(|| {
            self.by_lowercase_name
                .get(&name.to_lowercase())
                .map(|&idx| &self.regions[idx])
        })
    }

    /// Whether a region with exactly this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All regions in registry order.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Iterates regions in registry order.
    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    /// Number of registered regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl<'a> IntoIterator for &'a RegionRegistry {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
