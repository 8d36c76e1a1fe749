use crate::descriptor::{path_tail, PlaceableDescriptor, PlaceableItem};
use log::warn;
use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Type of a managed category plus the dynamic traits describing which
    /// class of external change should invalidate it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CategoryTraits: u32 {
        const TYPE_CONFIG = 0x01;
        const TYPE_ASSET = 0x02;
        const TYPE_EXTERNAL = 0x04;
        const TYPE_ANY = Self::TYPE_CONFIG.bits() | Self::TYPE_ASSET.bits() | Self::TYPE_EXTERNAL.bits();

        const TRACK_BLUEPRINT = 0x100;
        const TRACK_ASSET = 0x200;
        const TRACK_WORLD = 0x400;
        const TRACK_INTERVAL = 0x800;
    }
}

bitflags::bitflags! {
    /// What about a category went stale: its content, its registration info,
    /// or both.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DirtyMask: u8 {
        const CONTENT = 0x01;
        const INFO = 0x02;
        const ALL = 0x03;
    }
}

/// Reference to a toolbar icon by style set and style name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconRef {
    #[serde(default)]
    pub style_set: String,
    #[serde(default)]
    pub style_name: String,
}

impl IconRef {
    pub fn new(style_set: impl Into<String>, style_name: impl Into<String>) -> Self {
        Self { style_set: style_set.into(), style_name: style_name.into() }
    }
}

/// Registration surface of one category as the host panel sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryInfo {
    pub unique_id: String,
    pub display_name: String,
    pub short_display_name: String,
    pub icon: IconRef,
    pub tag_metadata: String,
    pub sort_order: i32,
    pub sortable: bool,
}

impl CategoryInfo {
    pub fn new(unique_id: impl Into<String>) -> Self {
        Self {
            unique_id: unique_id.into(),
            display_name: String::new(),
            short_display_name: String::new(),
            icon: IconRef::default(),
            tag_metadata: String::new(),
            sort_order: 0,
            sortable: true,
        }
    }

    /// Applies display fallbacks: an empty short name falls back to the display
    /// name, empty tag metadata falls back to `"PM" + unique_id`.
    pub fn with_fallbacks(mut self) -> Self {
        if self.short_display_name.is_empty() {
            self.short_display_name = self.display_name.clone();
        }
        if self.tag_metadata.is_empty() {
            self.tag_metadata = format!("PM{}", self.unique_id);
        }
        self
    }
}

/// Change-tracking switches declared by a category.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategoryTracking {
    /// Periodic gather-trigger interval in seconds; `None` disables ticking.
    pub tick_interval: Option<f32>,
    pub blueprint_changes: bool,
    pub asset_changes: bool,
    pub world_changes: bool,
}

impl CategoryTracking {
    pub(crate) fn trait_flags(&self) -> CategoryTraits {
        let mut flags = CategoryTraits::empty();
        if self.tick_interval.is_some() {
            flags |= CategoryTraits::TRACK_INTERVAL;
        }
        if self.blueprint_changes {
            flags |= CategoryTraits::TRACK_BLUEPRINT;
        }
        if self.asset_changes {
            flags |= CategoryTraits::TRACK_ASSET;
        }
        if self.world_changes {
            flags |= CategoryTraits::TRACK_WORLD;
        }
        flags
    }
}

/// One class/asset-driven palette category: user or plugin logic that produces
/// placeable item descriptors on demand.
///
/// Implementations are instantiated through a [`CategoryProvider`] during
/// discovery and owned by the subsystem's managed record for as long as the
/// category stays discovered.
pub trait PaletteCategory {
    /// Stable identifier. Must never be empty once the category is
    /// constructed, and must never change afterwards; a drift is a defect in
    /// the category implementation, not a recoverable condition.
    fn unique_id(&self) -> &str;

    /// Display surface used for panel registration. Fallbacks
    /// ([`CategoryInfo::with_fallbacks`]) are applied by the subsystem.
    fn info(&self) -> CategoryInfo;

    fn tracking(&self) -> CategoryTracking {
        CategoryTracking::default()
    }

    /// Called once after the category's identity is established, right after
    /// panel registration. A good place for the host to wire change
    /// subscriptions; those must be scoped to the record's lifetime.
    fn initialize(&mut self) {}

    /// Called when the declared tick interval elapses. The returned mask is
    /// applied as dirty state on the owning record.
    fn interval_update(&mut self) -> DirtyMask {
        DirtyMask::empty()
    }

    /// Stages descriptors for this category's content. A fresh context is
    /// supplied on every call, so repeated gathers without intervening state
    /// changes produce the same result.
    fn gather_items(&mut self, ctx: &mut GatherContext);
}

/// Reflection seam: enumerates and instantiates category classes. The core
/// only assumes enumeration is synchronous and idempotent for a given
/// loaded-state snapshot.
pub trait CategoryProvider {
    /// Class paths of all loaded, non-abstract category classes.
    fn loaded_category_classes(&self) -> Vec<String>;

    /// Whether the class path (native or generated) descends from the
    /// category base type.
    fn is_category_class(&self, class_path: &str) -> bool;

    fn instantiate(&self, class_path: &str) -> Option<Box<dyn PaletteCategory>>;
}

/// Staging area handed to [`PaletteCategory::gather_items`]. Collects
/// descriptors, rejecting invalid or duplicate ones, and optionally assigns
/// monotonically increasing sort orders.
#[derive(Default)]
pub struct GatherContext {
    staged: Vec<PlaceableDescriptor>,
    auto_order: Option<i32>,
}

impl GatherContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Arms the auto-order counter: every descriptor added afterwards gets its
    /// sort order overwritten with a pre-incremented value, so the first one
    /// assigned is `start + 1`. Descriptors added before arming keep theirs.
    pub fn set_auto_order(&mut self, start: i32) {
        self.auto_order = Some(start);
    }

    pub fn add(&mut self, mut descriptor: PlaceableDescriptor) {
        if !descriptor.is_valid_data() {
            warn!("rejected invalid placeable descriptor");
            return;
        }
        if let Some(order) = &mut self.auto_order {
            *order += 1;
            descriptor.sort_order = Some(*order);
        }
        if self.staged.iter().any(|existing| existing.identical_to(&descriptor)) {
            warn!("rejected duplicate placeable descriptor");
            return;
        }
        self.staged.push(descriptor);
    }

    /// Shortcut for wrapping an already-built entry.
    pub fn add_prebuilt(&mut self, item: PlaceableItem) {
        self.add(PlaceableDescriptor::prebuilt(item));
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Consumes the staged list, stable-sorted by sort order when the category
    /// is sortable.
    pub(crate) fn finish(self, sortable: bool) -> Vec<PlaceableDescriptor> {
        let mut staged = self.staged;
        if sortable {
            staged.sort_by_key(|d| d.sort_order.unwrap_or(0));
        }
        staged
    }
}

/// Derives a category id from a class or asset name, stripping the
/// generated-class suffix.
pub fn derive_unique_id(class_name: &str) -> String {
    let tail = path_tail(class_name);
    tail.strip_suffix("_C").unwrap_or(tail).to_string()
}
