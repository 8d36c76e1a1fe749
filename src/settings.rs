use crate::category::{CategoryInfo, IconRef};
use crate::descriptor::{path_tail, PlaceableDescriptor};
use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One entry of the persisted recently-placed list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentPlacement {
    #[serde(default)]
    pub display_label: String,
    #[serde(default)]
    pub factory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_path: Option<String>,
}

impl RecentPlacement {
    /// Builds an entry with a generated `F=<factory-tail> O=<path>` label,
    /// used when importing the panel's recent list.
    pub fn labelled(factory: impl Into<String>, object_path: Option<String>) -> Self {
        let factory = factory.into();
        let display_label = format!(
            "F={} O={}",
            path_tail(&factory),
            object_path.as_deref().unwrap_or("")
        );
        Self { display_label, factory, object_path }
    }
}

/// A config-driven category: identity, display surface, and a persisted item
/// list, all editable through the host's settings UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticCategoryConfig {
    pub unique_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub short_display_name: String,
    #[serde(default)]
    pub icon: IconRef,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default)]
    pub tag_metadata: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub items: Vec<PlaceableDescriptor>,
}

impl StaticCategoryConfig {
    pub fn new(unique_id: impl Into<String>) -> Self {
        Self {
            unique_id: unique_id.into(),
            display_name: String::new(),
            short_display_name: String::new(),
            icon: IconRef::default(),
            sortable: true,
            tag_metadata: String::new(),
            sort_order: 0,
            items: Vec::new(),
        }
    }

    pub fn category_info(&self) -> CategoryInfo {
        CategoryInfo {
            unique_id: self.unique_id.clone(),
            display_name: self.display_name.clone(),
            short_display_name: self.short_display_name.clone(),
            icon: self.icon.clone(),
            tag_metadata: self.tag_metadata.clone(),
            sort_order: self.sort_order,
            sortable: self.sortable,
        }
        .with_fallbacks()
    }
}

/// Visibility/order override for a host-native category the subsystem does not
/// manage itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineCategoryConfig {
    pub unique_id: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub order: i32,
}

impl EngineCategoryConfig {
    pub fn new(unique_id: impl Into<String>) -> Self {
        Self { unique_id: unique_id.into(), visible: true, order: 0 }
    }
}

fn default_true() -> bool {
    true
}

/// Which settings field a settings-UI edit touched. Drives the request flags
/// raised in response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    RecentlyPlaced,
    EngineCategories,
    DynamicCategories,
    StaticCategories,
    /// A field inside one static category or one of its items.
    CategoryContent,
}

/// Persisted palette configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteSettings {
    #[serde(default = "default_true")]
    pub enable_native_discovery: bool,
    #[serde(default = "default_true")]
    pub enable_asset_discovery: bool,
    #[serde(default = "default_true")]
    pub enable_change_tracking: bool,
    #[serde(default)]
    pub static_categories: Vec<StaticCategoryConfig>,
    /// Class paths to instantiate in addition to the scanned ones.
    #[serde(default)]
    pub dynamic_categories: Vec<String>,
    #[serde(default)]
    pub engine_categories: Vec<EngineCategoryConfig>,
    #[serde(default)]
    pub recently_placed: Vec<RecentPlacement>,
}

impl Default for PaletteSettings {
    fn default() -> Self {
        Self {
            enable_native_discovery: true,
            enable_asset_discovery: true,
            enable_change_tracking: true,
            static_categories: Vec::new(),
            dynamic_categories: Vec::new(),
            engine_categories: Vec::new(),
            recently_placed: Vec::new(),
        }
    }
}

impl PaletteSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        Ok(settings)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                warn!("settings load error: {err:#}; falling back to defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write settings file {}", path.display()))?;
        Ok(())
    }

    pub fn static_category(&self, unique_id: &str) -> Option<&StaticCategoryConfig> {
        self.static_categories.iter().find(|c| c.unique_id == unique_id)
    }
}
