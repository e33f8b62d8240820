//! Index configuration.
//!
//! The four covering parameters decide which cell a point is stored under
//! and how query regions are approximated, so every call against the same
//! stored data has to use the same values.
use crate::compute::cell::MAX_LEVEL;
use serde::de::Error;

/// Covering and storage-level configuration of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Coarsest level a covering may use.
    #[serde(default = "IndexConfig::default_min_level")]
    pub min_level: u8,

    /// Finest level; points are stored under their cell at this level.
    #[serde(default = "IndexConfig::default_max_level")]
    pub max_level: u8,

    /// Coverings only use levels `min_level + k * level_mod`.
    #[serde(default = "IndexConfig::default_level_mod")]
    pub level_mod: u8,

    /// Soft cap on the number of cells in a covering.
    #[serde(default = "IndexConfig::default_max_cells")]
    pub max_cells: usize,
}

impl IndexConfig {
    const fn default_min_level() -> u8 {
        4
    }

    const fn default_max_level() -> u8 {
        16
    }

    const fn default_level_mod() -> u8 {
        1
    }

    const fn default_max_cells() -> usize {
        8
    }

    pub fn with_min_level(mut self, level: u8) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_max_level(mut self, level: u8) -> Self {
        self.max_level = level;
        self
    }

    pub fn with_level_mod(mut self, level_mod: u8) -> Self {
        self.level_mod = level_mod;
        self
    }

    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        if max_cells > 1_000 {
            log::warn!(
                "max_cells of {} is very large; coverings will issue many small range scans",
                max_cells
            );
        }
        self.max_cells = max_cells;
        self
    }

    /// Highest level a covering actually emits: `max_level` rounded down so
    /// that it stays on the `level_mod` grid anchored at `min_level`.
    pub fn effective_max_level(&self) -> u8 {
        let step = self.level_mod.max(1);
        let span = self.max_level.saturating_sub(self.min_level);
        self.max_level - span % step
    }

    /// Packs the four parameters into a single comparable value.
    pub fn fingerprint(&self) -> u64 {
        (u64::from(self.min_level) << 56)
            | (u64::from(self.max_level) << 48)
            | (u64::from(self.level_mod) << 40)
            | (self.max_cells as u64 & 0xFF_FFFF_FFFF)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_level > MAX_LEVEL {
            return Err(format!(
                "max_level must be at most {}, got {}",
                MAX_LEVEL, self.max_level
            ));
        }

        if self.min_level > self.max_level {
            return Err(format!(
                "min_level ({}) must not exceed max_level ({})",
                self.min_level, self.max_level
            ));
        }

        if !(1..=3).contains(&self.level_mod) {
            return Err(format!(
                "level_mod must be between 1 and 3, got {}",
                self.level_mod
            ));
        }

        if self.max_cells == 0 {
            return Err("max_cells must be greater than zero".to_string());
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: IndexConfig = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: IndexConfig = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            min_level: Self::default_min_level(),
            max_level: Self::default_max_level(),
            level_mod: Self::default_level_mod(),
            max_cells: Self::default_max_cells(),
        }
    }
}
