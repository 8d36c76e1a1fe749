use crate::asset_index::AssetMeta;
use serde::{Deserialize, Serialize};

/// One concrete, spawnable entry of the placement panel.
///
/// The native name identifies the entry inside its category; the host keys its
/// favorites list on it, so it should stay unique within one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceableItem {
    pub native_name: String,
    pub display_name: String,
    pub factory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

impl PlaceableItem {
    fn from_factory(factory: &FactoryInfo) -> Self {
        Self {
            native_name: path_tail(&factory.class_path).to_string(),
            display_name: factory.display_name.clone(),
            factory: factory.class_path.clone(),
            object_path: None,
            sort_order: None,
        }
    }

    fn from_factory_asset(factory: &FactoryInfo, asset: &AssetMeta) -> Self {
        Self {
            native_name: asset.name.clone(),
            display_name: asset.name.clone(),
            factory: factory.class_path.clone(),
            object_path: Some(asset.path.clone()),
            sort_order: None,
        }
    }
}

/// A placement factory known to the host editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryInfo {
    pub class_path: String,
    pub display_name: String,
}

/// Factory and object lookups backing descriptor resolution. Lookups are
/// synchronous and may trigger loading; a miss is reported as `None`.
pub trait PlacementResolver {
    fn find_factory(&self, factory_class: &str) -> Option<FactoryInfo>;
    fn find_factory_for_actor(&self, actor_class: &str) -> Option<FactoryInfo>;
    fn find_factory_for_asset(&self, asset: &AssetMeta) -> Option<FactoryInfo>;
    fn load_object(&self, object_path: &str) -> Option<AssetMeta>;
}

/// Declarative, not-yet-resolved specification of one placeable item.
///
/// Constructed transiently during a gather cycle and consumed immediately into
/// a [`PlaceableItem`]; only descriptors of config-driven categories are
/// persisted as settings data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceableDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    pub source: DescriptorSource,
}

/// The construction strategy of a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DescriptorSource {
    /// Wraps an already-built entry. Opaque passthrough; never reported as
    /// identical to anything.
    Prebuilt { item: PlaceableItem },
    /// Factory class only, spawns the factory's default.
    FactoryClass { factory_class: String },
    /// Factory class plus resolved asset metadata. Not intended for persisted
    /// config.
    FactoryAsset { factory_class: String, asset: AssetMeta },
    /// Factory class plus a soft object reference.
    FactoryObject { factory_class: String, object_path: String },
    /// Actor class reference, factory detected automatically.
    ActorClass { actor_class: String },
    /// Soft object reference, factory detected automatically.
    AssetObject { object_path: String },
    /// Resolved asset metadata, factory detected automatically. Not intended
    /// for persisted config.
    AssetData { asset: AssetMeta },
}

impl PlaceableDescriptor {
    pub fn prebuilt(item: PlaceableItem) -> Self {
        Self::from_source(DescriptorSource::Prebuilt { item })
    }

    pub fn factory_class(factory_class: impl Into<String>) -> Self {
        Self::from_source(DescriptorSource::FactoryClass { factory_class: factory_class.into() })
    }

    pub fn factory_asset(factory_class: impl Into<String>, asset: AssetMeta) -> Self {
        Self::from_source(DescriptorSource::FactoryAsset { factory_class: factory_class.into(), asset })
    }

    pub fn factory_object(factory_class: impl Into<String>, object_path: impl Into<String>) -> Self {
        Self::from_source(DescriptorSource::FactoryObject {
            factory_class: factory_class.into(),
            object_path: object_path.into(),
        })
    }

    pub fn actor_class(actor_class: impl Into<String>) -> Self {
        Self::from_source(DescriptorSource::ActorClass { actor_class: actor_class.into() })
    }

    pub fn asset_object(object_path: impl Into<String>) -> Self {
        Self::from_source(DescriptorSource::AssetObject { object_path: object_path.into() })
    }

    pub fn asset_data(asset: AssetMeta) -> Self {
        Self::from_source(DescriptorSource::AssetData { asset })
    }

    fn from_source(source: DescriptorSource) -> Self {
        Self { display_name: None, sort_order: None, source }
    }

    pub fn named(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn ordered(mut self, sort_order: i32) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    /// Pure check that every required reference is present. Does not load
    /// anything; call before [`PlaceableDescriptor::make_item`].
    pub fn is_valid_data(&self) -> bool {
        match &self.source {
            DescriptorSource::Prebuilt { item } => !item.factory.is_empty(),
            DescriptorSource::FactoryClass { factory_class } => !factory_class.is_empty(),
            DescriptorSource::FactoryAsset { factory_class, asset } => {
                !factory_class.is_empty() && !asset.path.is_empty()
            }
            DescriptorSource::FactoryObject { factory_class, object_path } => {
                !factory_class.is_empty() && !object_path.is_empty()
            }
            DescriptorSource::ActorClass { actor_class } => !actor_class.is_empty(),
            DescriptorSource::AssetObject { object_path } => !object_path.is_empty(),
            DescriptorSource::AssetData { asset } => !asset.path.is_empty(),
        }
    }

    /// Variant-specific identity used for duplicate suppression within one
    /// gather cycle. Cross-variant comparisons are always unequal; prebuilt
    /// entries are opaque and never identical.
    pub fn identical_to(&self, other: &PlaceableDescriptor) -> bool {
        use DescriptorSource::*;
        match (&self.source, &other.source) {
            (Prebuilt { .. }, Prebuilt { .. }) => false,
            (FactoryClass { factory_class: a }, FactoryClass { factory_class: b }) => a == b,
            (
                FactoryAsset { factory_class: a, asset: x },
                FactoryAsset { factory_class: b, asset: y },
            ) => a == b && x == y,
            (
                FactoryObject { factory_class: a, object_path: x },
                FactoryObject { factory_class: b, object_path: y },
            ) => a == b && x == y,
            (ActorClass { actor_class: a }, ActorClass { actor_class: b }) => a == b,
            (AssetObject { object_path: a }, AssetObject { object_path: b }) => a == b,
            (AssetData { asset: a }, AssetData { asset: b }) => a == b,
            _ => false,
        }
    }

    /// Resolves the descriptor into a concrete entry, loading soft references
    /// synchronously. Any resolution miss yields `None`; never panics.
    pub fn make_item(&self, resolver: &dyn PlacementResolver) -> Option<PlaceableItem> {
        let mut item = match &self.source {
            DescriptorSource::Prebuilt { item } => item.clone(),
            DescriptorSource::FactoryClass { factory_class } => {
                let factory = resolver.find_factory(factory_class)?;
                PlaceableItem::from_factory(&factory)
            }
            DescriptorSource::FactoryAsset { factory_class, asset } => {
                let factory = resolver.find_factory(factory_class)?;
                PlaceableItem::from_factory_asset(&factory, asset)
            }
            DescriptorSource::FactoryObject { factory_class, object_path } => {
                let factory = resolver.find_factory(factory_class)?;
                let asset = resolver.load_object(object_path)?;
                PlaceableItem::from_factory_asset(&factory, &asset)
            }
            DescriptorSource::ActorClass { actor_class } => {
                let factory = resolver.find_factory_for_actor(actor_class)?;
                PlaceableItem {
                    native_name: path_tail(actor_class).to_string(),
                    display_name: path_tail(actor_class).to_string(),
                    factory: factory.class_path,
                    object_path: Some(actor_class.clone()),
                    sort_order: None,
                }
            }
            DescriptorSource::AssetObject { object_path } => {
                let asset = resolver.load_object(object_path)?;
                let factory = resolver.find_factory_for_asset(&asset)?;
                PlaceableItem::from_factory_asset(&factory, &asset)
            }
            DescriptorSource::AssetData { asset } => {
                let factory = resolver.find_factory_for_asset(asset)?;
                PlaceableItem::from_factory_asset(&factory, asset)
            }
        };
        if let Some(display_name) = &self.display_name {
            item.display_name = display_name.clone();
        }
        if let Some(sort_order) = self.sort_order {
            item.sort_order = Some(sort_order);
        }
        Some(item)
    }
}

/// Last segment of an object or class path, after the final `.` or `/`.
pub(crate) fn path_tail(path: &str) -> &str {
    path.rsplit(['.', '/']).next().unwrap_or(path)
}
