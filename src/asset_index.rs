use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolved metadata for one indexed asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMeta {
    pub name: String,
    pub path: String,
    pub class: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl AssetMeta {
    pub fn new(name: impl Into<String>, path: impl Into<String>, class: impl Into<String>) -> Self {
        Self { name: name.into(), path: path.into(), class: class.into(), tags: BTreeMap::new() }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(|v| v.as_str())
    }
}

/// Filter for enumerate queries against the asset index.
#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    pub class: Option<String>,
    pub path_prefix: Option<String>,
    pub required_tag: Option<String>,
}

impl AssetFilter {
    pub fn for_class(class: impl Into<String>) -> Self {
        Self { class: Some(class.into()), ..Default::default() }
    }

    pub fn matches(&self, asset: &AssetMeta) -> bool {
        if let Some(class) = &self.class {
            if &asset.class != class {
                return false;
            }
        }
        if let Some(prefix) = &self.path_prefix {
            if !asset.path.starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(tag) = &self.required_tag {
            if !asset.tags.contains_key(tag) {
                return false;
            }
        }
        true
    }
}

/// Query surface of the host's asset index. Enumeration is synchronous and
/// idempotent for a given loaded-state snapshot.
pub trait AssetIndex {
    fn enumerate(&self, filter: &AssetFilter, visit: &mut dyn FnMut(&AssetMeta));
    fn resolve(&self, path: &str) -> Option<AssetMeta>;
    /// True while the initial scan is still running. The subsystem defers all
    /// work until `on_initial_scan_complete` is delivered.
    fn is_scanning(&self) -> bool;
}

/// In-memory asset index for hosts without a real one and for tests.
#[derive(Default)]
pub struct MemoryAssetIndex {
    assets: Vec<AssetMeta>,
    scanning: bool,
}

impl MemoryAssetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: AssetMeta) {
        if let Some(existing) = self.assets.iter_mut().find(|a| a.path == asset.path) {
            *existing = asset;
        } else {
            self.assets.push(asset);
        }
    }

    pub fn remove(&mut self, path: &str) {
        self.assets.retain(|a| a.path != path);
    }

    pub fn set_scanning(&mut self, scanning: bool) {
        self.scanning = scanning;
    }
}

impl AssetIndex for MemoryAssetIndex {
    fn enumerate(&self, filter: &AssetFilter, visit: &mut dyn FnMut(&AssetMeta)) {
        for asset in &self.assets {
            if filter.matches(asset) {
                visit(asset);
            }
        }
    }

    fn resolve(&self, path: &str) -> Option<AssetMeta> {
        self.assets.iter().find(|a| a.path == path).cloned()
    }

    fn is_scanning(&self) -> bool {
        self.scanning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_matches_class_prefix_and_tag() {
        let asset = AssetMeta::new("Crate", "/game/props/crate", "StaticMesh").with_tag("nanite", "false");

        assert!(AssetFilter::for_class("StaticMesh").matches(&asset));
        assert!(!AssetFilter::for_class("Blueprint").matches(&asset));

        let filter = AssetFilter {
            class: Some("StaticMesh".into()),
            path_prefix: Some("/game/props".into()),
            required_tag: Some("nanite".into()),
        };
        assert!(filter.matches(&asset));

        let filter = AssetFilter { path_prefix: Some("/engine".into()), ..Default::default() };
        assert!(!filter.matches(&asset));
    }

    #[test]
    fn memory_index_insert_replaces_by_path() {
        let mut index = MemoryAssetIndex::new();
        index.insert(AssetMeta::new("A", "/game/a", "StaticMesh"));
        index.insert(AssetMeta::new("A2", "/game/a", "StaticMesh"));

        let resolved = index.resolve("/game/a").expect("resolved");
        assert_eq!(resolved.name, "A2");

        index.remove("/game/a");
        assert!(index.resolve("/game/a").is_none());
    }
}
