use crate::asset_index::{AssetFilter, AssetIndex};
use crate::category::{
    CategoryInfo, CategoryProvider, CategoryTraits, DirtyMask, GatherContext, PaletteCategory,
};
use crate::descriptor::{PlaceableDescriptor, PlacementResolver};
use crate::panel::{PanelEvent, PlacementHandle, PlacementPanel};
use crate::settings::{
    EngineCategoryConfig, PaletteSettings, RecentPlacement, SettingsField, StaticCategoryConfig,
};
use log::{debug, warn};
use std::mem;
use std::path::PathBuf;
use std::time::Instant;

/// Advisory wall-clock budget for one tick. Exceeding it is logged, never
/// enforced.
const TICK_BUDGET_SECS: f32 = 5.0;

/// Asset-index tag keys consulted by blueprint discovery.
pub const TAG_GENERATED_CLASS: &str = "generated_class";
pub const TAG_NATIVE_PARENT_CLASS: &str = "native_parent_class";
pub const TAG_PARENT_CLASS: &str = "parent_class";
/// Asset class scanned for category blueprints.
pub const BLUEPRINT_CLASS: &str = "Blueprint";

/// What backs a managed category's identity and content.
enum CategoryBacking {
    /// Items come from the persisted static-category config with the same id.
    Config,
    /// A live category object instantiated from a class.
    Asset {
        class_path: String,
        instance: Box<dyn PaletteCategory>,
        /// Seconds accumulated towards the next interval update. Reset to
        /// zero when the interval fires, not decremented.
        accumulator: f32,
    },
    /// Registered at runtime through the external API. Survives discovery
    /// cycles until explicitly removed.
    External { data: StaticCategoryConfig, pending_kill: bool },
}

/// One category under subsystem management: identity, traits, dirty state,
/// live item handles, and its backing.
pub struct ManagedCategory {
    unique_id: String,
    traits: CategoryTraits,
    registered: bool,
    dirty_content: bool,
    dirty_info: bool,
    handles: Vec<PlacementHandle>,
    backing: CategoryBacking,
}

impl ManagedCategory {
    fn new_config(unique_id: impl Into<String>) -> Self {
        Self::new(unique_id.into(), CategoryTraits::TYPE_CONFIG, CategoryBacking::Config)
    }

    fn new_asset(
        unique_id: String,
        class_path: impl Into<String>,
        instance: Box<dyn PaletteCategory>,
    ) -> Self {
        let mut record = Self::new(
            unique_id,
            CategoryTraits::TYPE_ASSET,
            CategoryBacking::Asset {
                class_path: class_path.into(),
                instance,
                accumulator: 0.0,
            },
        );
        record.refresh_traits();
        record
    }

    fn new_external(data: StaticCategoryConfig) -> Self {
        let unique_id = data.unique_id.clone();
        Self::new(
            unique_id,
            CategoryTraits::TYPE_EXTERNAL,
            CategoryBacking::External { data, pending_kill: false },
        )
    }

    fn new(unique_id: String, traits: CategoryTraits, backing: CategoryBacking) -> Self {
        Self {
            unique_id,
            traits,
            registered: false,
            dirty_content: false,
            dirty_info: false,
            handles: Vec::new(),
            backing,
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn traits(&self) -> CategoryTraits {
        self.traits
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn item_count(&self) -> usize {
        self.handles.len()
    }

    pub fn class_path(&self) -> Option<&str> {
        match &self.backing {
            CategoryBacking::Asset { class_path, .. } => Some(class_path),
            _ => None,
        }
    }

    fn is_pending_kill(&self) -> bool {
        matches!(self.backing, CategoryBacking::External { pending_kill: true, .. })
    }

    /// Registration surface, with display fallbacks applied.
    fn category_info(&self, settings: &PaletteSettings) -> CategoryInfo {
        match &self.backing {
            CategoryBacking::Config => settings
                .static_category(&self.unique_id)
                .map(StaticCategoryConfig::category_info)
                .unwrap_or_else(|| CategoryInfo::new(&self.unique_id).with_fallbacks()),
            CategoryBacking::Asset { instance, .. } => {
                debug_assert_eq!(instance.unique_id(), self.unique_id);
                instance.info().with_fallbacks()
            }
            CategoryBacking::External { data, .. } => data.category_info(),
        }
    }

    fn register(&mut self, panel: &mut dyn PlacementPanel, settings: &PaletteSettings) {
        debug_assert!(!self.unique_id.is_empty());
        let info = self.category_info(settings);
        if !panel.register_category(info) {
            warn!("panel rejected category {}", self.unique_id);
            return;
        }
        self.registered = true;
        if let CategoryBacking::Asset { instance, .. } = &mut self.backing {
            instance.initialize();
        }
        self.refresh_traits();
    }

    fn unregister(&mut self, panel: &mut dyn PlacementPanel) {
        self.clear_items(panel);
        if self.registered {
            panel.unregister_category(&self.unique_id);
            self.registered = false;
        }
    }

    fn clear_items(&mut self, panel: &mut dyn PlacementPanel) {
        for handle in self.handles.drain(..) {
            panel.unregister_item(handle);
        }
    }

    /// Produces this category's current descriptor list.
    fn gather(&mut self, settings: &PaletteSettings) -> Vec<PlaceableDescriptor> {
        match &mut self.backing {
            CategoryBacking::Config => settings
                .static_category(&self.unique_id)
                .map(|config| config.items.clone())
                .unwrap_or_default(),
            CategoryBacking::External { data, .. } => data.items.clone(),
            CategoryBacking::Asset { instance, .. } => {
                let sortable = instance.info().sortable;
                let mut ctx = GatherContext::new();
                instance.gather_items(&mut ctx);
                ctx.finish(sortable)
            }
        }
    }

    /// Advances the interval accumulator; returns the mask the category
    /// reported when its interval fired.
    fn tick(&mut self, delta_seconds: f32) -> DirtyMask {
        let CategoryBacking::Asset { instance, accumulator, .. } = &mut self.backing else {
            return DirtyMask::empty();
        };
        let Some(interval) = instance.tracking().tick_interval else {
            return DirtyMask::empty();
        };
        *accumulator += delta_seconds;
        if *accumulator < interval {
            return DirtyMask::empty();
        }
        *accumulator = 0.0;
        instance.interval_update()
    }

    /// Recomputes the dynamic tracking traits, keeping the type bits.
    fn refresh_traits(&mut self) {
        let type_bits = self.traits & CategoryTraits::TYPE_ANY;
        let track_bits = match &self.backing {
            CategoryBacking::Asset { instance, .. } => instance.tracking().trait_flags(),
            _ => CategoryTraits::empty(),
        };
        self.traits = type_bits | track_bits;
    }

    fn mark_dirty(&mut self, mask: DirtyMask) {
        if mask.contains(DirtyMask::CONTENT) {
            self.dirty_content = true;
        }
        if mask.contains(DirtyMask::INFO) {
            self.dirty_info = true;
        }
    }

    /// Newly discovered records need their content built but their info was
    /// just registered.
    fn set_fresh_dirty(&mut self) {
        self.dirty_content = true;
        self.dirty_info = false;
    }

    fn take_dirty_content(&mut self) -> bool {
        mem::take(&mut self.dirty_content)
    }

    fn take_dirty_info(&mut self) -> bool {
        mem::take(&mut self.dirty_info)
    }
}

/// Work requested since the last tick. Every flag is cleared before its
/// handler runs, so a handler re-raising it defers to the next tick.
#[derive(Default)]
struct PendingWork {
    discover: bool,
    populate: bool,
    update_engine: bool,
    update_managed: bool,
    apply_recent: bool,
    save: bool,
    refresh_toolbar: bool,
    refresh_content: bool,
}

/// An editor-side change relevant to change-tracking categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorChange {
    BlueprintCompiled,
    AssetsChanged,
    WorldChanged,
}

/// Console-command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteCommand {
    DiscoverCategories,
    PopulateCategories,
    UpdateCategories,
    UpdateToolbar,
    ClearRecent,
}

/// The palette subsystem: discovers categories from config, class scan, and
/// asset scan, reconciles them against the managed set, and drains requested
/// work once per tick in a fixed order.
pub struct PaletteSubsystem {
    settings: PaletteSettings,
    settings_path: Option<PathBuf>,
    asset_index: Box<dyn AssetIndex>,
    provider: Box<dyn CategoryProvider>,
    resolver: Box<dyn PlacementResolver>,
    panel: Option<Box<dyn PlacementPanel>>,
    managed: Vec<ManagedCategory>,
    pending: PendingWork,
    /// The asset index's initial scan is still running; all work is deferred.
    pending_asset_load: bool,
    ready: bool,
}

impl PaletteSubsystem {
    pub fn new(
        settings: PaletteSettings,
        asset_index: Box<dyn AssetIndex>,
        provider: Box<dyn CategoryProvider>,
        resolver: Box<dyn PlacementResolver>,
    ) -> Self {
        let pending_asset_load = asset_index.is_scanning();
        Self {
            settings,
            settings_path: None,
            asset_index,
            provider,
            resolver,
            panel: None,
            managed: Vec::new(),
            pending: PendingWork::default(),
            pending_asset_load,
            ready: false,
        }
    }

    /// Sets where `save` requests persist the settings. Without a path, save
    /// requests are dropped with a debug line.
    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    pub fn settings(&self) -> &PaletteSettings {
        &self.settings
    }

    /// Direct settings access for the host's settings UI. Pair edits with
    /// [`PaletteSubsystem::on_settings_changed`] so the matching work gets
    /// requested.
    pub fn settings_mut(&mut self) -> &mut PaletteSettings {
        &mut self.settings
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn managed_ids(&self) -> Vec<String> {
        self.managed.iter().map(|m| m.unique_id.clone()).collect()
    }

    pub fn managed(&self, unique_id: &str) -> Option<&ManagedCategory> {
        self.managed.iter().find(|m| m.unique_id == unique_id)
    }

    /// Attaches the host panel once it exists. Imports the panel's current
    /// state into settings, marks the subsystem ready, requests the first
    /// discovery, and applies engine-category overrides immediately.
    pub fn attach_panel(&mut self, panel: Box<dyn PlacementPanel>) {
        if self.panel.is_some() {
            warn!("placement panel already attached");
            return;
        }
        self.panel = Some(panel);
        self.ready = true;
        self.import_panel_state();
        {
            // Categories created through the external API before the panel
            // existed still need their registration.
            let Self { panel, managed, settings, .. } = self;
            if let Some(panel) = panel.as_mut() {
                for record in managed.iter_mut() {
                    if !record.registered {
                        record.register(panel.as_mut(), settings);
                    }
                }
            }
        }
        self.pending.discover = true;
        self.apply_engine_category_settings();
    }

    /// Unregisters everything and drops panel access. State is rebuilt from
    /// scratch on the next attach.
    pub fn shutdown(&mut self) {
        if let Some(panel) = self.panel.as_mut() {
            for record in &mut self.managed {
                record.unregister(panel.as_mut());
            }
        }
        self.managed.clear();
        self.panel = None;
        self.ready = false;
        self.pending = PendingWork::default();
    }

    /// Advances interval trackers and drains requested work in a fixed order.
    /// No-op until a panel is attached and the initial asset scan finished.
    pub fn tick(&mut self, delta_seconds: f32) {
        if !self.ready || self.pending_asset_load {
            return;
        }
        let started = Instant::now();

        let mut raised = DirtyMask::empty();
        for record in &mut self.managed {
            let mask = record.tick(delta_seconds);
            if !mask.is_empty() {
                record.mark_dirty(mask);
                raised |= mask;
            }
        }
        self.raise_for_mask(raised);

        if mem::take(&mut self.pending.discover) {
            self.try_discover_categories();
        }
        if mem::take(&mut self.pending.populate) {
            self.try_populate_items();
        }
        if mem::take(&mut self.pending.update_engine) {
            self.apply_engine_category_settings();
        }
        if mem::take(&mut self.pending.update_managed) {
            self.apply_managed_category_settings();
        }
        if mem::take(&mut self.pending.apply_recent) {
            self.apply_recent_list();
        }
        if mem::take(&mut self.pending.save) {
            self.try_save_settings();
        }
        if mem::take(&mut self.pending.refresh_toolbar) {
            if let Some(panel) = self.panel.as_mut() {
                panel.notify_categories_changed();
            }
        }
        if mem::take(&mut self.pending.refresh_content) {
            if let Some(panel) = self.panel.as_mut() {
                panel.request_content_refresh();
            }
        }

        let elapsed = started.elapsed().as_secs_f32();
        if elapsed > TICK_BUDGET_SECS {
            warn!("palette tick took {elapsed:.1}s");
        }
    }

    // --- discovery -------------------------------------------------------

    /// Rebuilds the desired category set from the three sources (config wins
    /// over class scan, class scan over asset scan) and reconciles the
    /// managed set against it. External categories survive absence; those
    /// flagged pending-kill are purged here.
    fn try_discover_categories(&mut self) {
        let mut discovered: Vec<ManagedCategory> = Vec::new();
        self.discover_from_config(&mut discovered);
        if self.settings.enable_native_discovery {
            self.discover_from_class_scan(&mut discovered);
        }
        if self.settings.enable_asset_discovery {
            self.discover_from_asset_scan(&mut discovered);
        }

        let Self { panel, managed, settings, pending, .. } = self;
        let mut changed = false;

        let mut index = 0;
        while index < managed.len() {
            let keep = {
                let record = &managed[index];
                if record.is_pending_kill() {
                    false
                } else if record.traits.contains(CategoryTraits::TYPE_EXTERNAL) {
                    true
                } else {
                    discovered.iter().any(|d| d.unique_id == record.unique_id)
                }
            };
            if keep {
                index += 1;
                continue;
            }
            let mut record = managed.remove(index);
            debug!("category {} no longer discovered; removing", record.unique_id);
            if let Some(panel) = panel.as_mut() {
                record.unregister(panel.as_mut());
            }
            changed = true;
        }

        for mut record in discovered {
            if managed.iter().any(|m| m.unique_id == record.unique_id) {
                continue;
            }
            record.set_fresh_dirty();
            if let Some(panel) = panel.as_mut() {
                record.register(panel.as_mut(), settings);
            }
            managed.push(record);
            changed = true;
        }

        if changed {
            pending.refresh_toolbar = true;
            pending.populate = true;
        }
    }

    fn discover_from_config(&self, discovered: &mut Vec<ManagedCategory>) {
        for config in &self.settings.static_categories {
            if config.unique_id.is_empty() {
                warn!("static category with empty unique id; skipping");
                continue;
            }
            push_unique(discovered, ManagedCategory::new_config(&config.unique_id));
        }
        for class_path in &self.settings.dynamic_categories {
            self.instantiate_category(class_path, discovered);
        }
    }

    fn discover_from_class_scan(&self, discovered: &mut Vec<ManagedCategory>) {
        for class_path in self.provider.loaded_category_classes() {
            self.instantiate_category(&class_path, discovered);
        }
    }

    /// Scans blueprint assets whose parent class is a category class and
    /// instantiates their generated classes.
    fn discover_from_asset_scan(&self, discovered: &mut Vec<ManagedCategory>) {
        let filter = AssetFilter::for_class(BLUEPRINT_CLASS);
        let mut generated: Vec<String> = Vec::new();
        self.asset_index.enumerate(&filter, &mut |asset| {
            let parent = asset
                .tag(TAG_NATIVE_PARENT_CLASS)
                .or_else(|| asset.tag(TAG_PARENT_CLASS));
            let Some(parent) = parent else { return };
            if !self.provider.is_category_class(parent) {
                return;
            }
            if let Some(generated_class) = asset.tag(TAG_GENERATED_CLASS) {
                generated.push(generated_class.to_string());
            }
        });
        for class_path in generated {
            self.instantiate_category(&class_path, discovered);
        }
    }

    fn instantiate_category(&self, class_path: &str, discovered: &mut Vec<ManagedCategory>) {
        let Some(instance) = self.provider.instantiate(class_path) else {
            warn!("failed to instantiate category class {class_path}");
            return;
        };
        let unique_id = instance.unique_id().to_string();
        if unique_id.is_empty() {
            warn!("category class {class_path} produced an empty unique id; skipping");
            return;
        }
        push_unique(discovered, ManagedCategory::new_asset(unique_id, class_path, instance));
    }

    // --- population ------------------------------------------------------

    /// Regenerates every content-dirty category: unregisters its previous
    /// items, gathers fresh descriptors, resolves and registers them. Running
    /// it twice without new dirt is a no-op, so it is safe to over-request.
    fn try_populate_items(&mut self) {
        let Self { panel, managed, settings, resolver, pending, .. } = self;
        let Some(panel) = panel.as_mut() else { return };
        let panel = panel.as_mut();
        let mut changed = false;

        for record in managed.iter_mut() {
            if !record.take_dirty_content() {
                continue;
            }
            record.clear_items(panel);
            let mut known_names: Vec<String> = Vec::new();
            for descriptor in record.gather(settings) {
                if !descriptor.is_valid_data() {
                    warn!("invalid descriptor in category {}; skipping", record.unique_id);
                    continue;
                }
                let Some(item) = descriptor.make_item(resolver.as_ref()) else {
                    warn!("unresolvable descriptor in category {}; skipping", record.unique_id);
                    continue;
                };
                if known_names.iter().any(|name| name == &item.native_name) {
                    // Registered anyway; the panel keys favorites on the name,
                    // so the duplicates will share favorite state.
                    warn!(
                        "duplicate item name {} in category {}",
                        item.native_name, record.unique_id
                    );
                }
                let native_name = item.native_name.clone();
                match panel.register_item(&record.unique_id, item) {
                    Some(handle) => {
                        record.handles.push(handle);
                        known_names.push(native_name);
                    }
                    None => warn!(
                        "panel rejected item {native_name} in category {}",
                        record.unique_id
                    ),
                }
            }
            panel.notify_category_refreshed(&record.unique_id);
            changed = true;
        }

        if changed {
            pending.refresh_toolbar = true;
            pending.refresh_content = true;
        }
    }

    // --- info updates ----------------------------------------------------

    /// Applies persisted visibility and order overrides to the panel's
    /// host-native categories.
    fn apply_engine_category_settings(&mut self) {
        let Self { panel, settings, pending, .. } = self;
        let Some(panel) = panel.as_mut() else { return };
        let mut hidden: Vec<String> = Vec::new();
        for config in &settings.engine_categories {
            if !config.visible {
                hidden.push(config.unique_id.clone());
            }
            if let Some(mut info) = panel.category(&config.unique_id) {
                if info.sort_order != config.order {
                    info.sort_order = config.order;
                    panel.update_category_info(&info);
                }
            }
        }
        panel.set_hidden_categories(hidden);
        pending.refresh_toolbar = true;
    }

    /// Pushes refreshed registration info for every info-dirty managed
    /// category through the panel's in-place update channel.
    fn apply_managed_category_settings(&mut self) {
        let Self { panel, managed, settings, pending, .. } = self;
        let Some(panel) = panel.as_mut() else { return };
        let mut changed = false;
        for record in managed.iter_mut() {
            if !record.take_dirty_info() {
                continue;
            }
            record.refresh_traits();
            let info = record.category_info(settings);
            if panel.update_category_info(&info) {
                panel.notify_category_refreshed(&record.unique_id);
            } else if record.registered {
                warn!("panel has no category {} to update", record.unique_id);
            }
            changed = true;
        }
        if changed {
            pending.refresh_toolbar = true;
        }
    }

    fn apply_recent_list(&mut self) {
        let Self { panel, settings, pending, .. } = self;
        let Some(panel) = panel.as_mut() else { return };
        panel.set_recent_list(settings.recently_placed.clone());
        pending.refresh_content = true;
    }

    fn try_save_settings(&mut self) {
        let Some(path) = &self.settings_path else {
            debug!("no settings path configured; dropping save request");
            return;
        };
        if let Err(err) = self.settings.save(path) {
            warn!("settings save failed: {err:#}");
        }
    }

    /// Rebuilds the persisted engine-category list from the panel's
    /// registered names, skipping managed ids and preserving the previous
    /// visible/order values, and imports the panel's recent list.
    fn import_panel_state(&mut self) {
        let Self { panel, managed, settings, pending, .. } = self;
        let Some(panel) = panel.as_mut() else { return };

        let previous = mem::take(&mut settings.engine_categories);
        for name in panel.registered_category_names() {
            if managed.iter().any(|m| m.unique_id == name) {
                continue;
            }
            let entry = previous
                .iter()
                .find(|e| e.unique_id == name)
                .cloned()
                .unwrap_or_else(|| {
                    let mut entry = EngineCategoryConfig::new(&name);
                    if let Some(info) = panel.category(&name) {
                        entry.order = info.sort_order;
                    }
                    entry
                });
            settings.engine_categories.push(entry);
        }
        settings.engine_categories.sort_by_key(|e| e.order);

        settings.recently_placed = panel
            .recently_placed()
            .into_iter()
            .map(|entry| RecentPlacement::labelled(entry.factory, entry.object_path))
            .collect();
        pending.save = true;
    }

    // --- dirty marking ---------------------------------------------------

    /// Marks one managed category dirty and requests the matching work.
    pub fn mark_category_dirty(&mut self, unique_id: &str, mask: DirtyMask) {
        let Some(record) = self.managed.iter_mut().find(|m| m.unique_id == unique_id) else {
            return;
        };
        record.mark_dirty(mask);
        self.raise_for_mask(mask);
    }

    /// Marks every managed category whose traits intersect the given set.
    pub fn mark_trait_dirty(&mut self, traits: CategoryTraits, mask: DirtyMask) {
        let mut any = false;
        for record in &mut self.managed {
            if record.traits.intersects(traits) {
                record.mark_dirty(mask);
                any = true;
            }
        }
        if any {
            self.raise_for_mask(mask);
        }
    }

    fn raise_for_mask(&mut self, mask: DirtyMask) {
        if mask.contains(DirtyMask::CONTENT) {
            self.pending.populate = true;
        }
        if mask.contains(DirtyMask::INFO) {
            self.pending.update_managed = true;
        }
    }

    // --- external API ----------------------------------------------------

    /// Registers a runtime-defined category. It is registered with the panel
    /// immediately and populated on the next tick. Fails on an empty or
    /// already-managed id.
    pub fn create_external_category(&mut self, data: StaticCategoryConfig) -> bool {
        if data.unique_id.is_empty() {
            warn!("external category with empty unique id; rejected");
            return false;
        }
        if self.managed.iter().any(|m| m.unique_id == data.unique_id) {
            warn!("external category {} already exists; rejected", data.unique_id);
            return false;
        }
        let mut record = ManagedCategory::new_external(data);
        record.set_fresh_dirty();
        let Self { panel, managed, settings, pending, .. } = self;
        if let Some(panel) = panel.as_mut() {
            record.register(panel.as_mut(), settings);
        }
        managed.push(record);
        pending.discover = true;
        pending.populate = true;
        pending.refresh_toolbar = true;
        true
    }

    /// Flags an external category for removal; the next discovery cycle
    /// purges it.
    pub fn remove_external_category(&mut self, unique_id: &str) -> bool {
        let Some(record) = self
            .managed
            .iter_mut()
            .find(|m| m.unique_id == unique_id && m.traits.contains(CategoryTraits::TYPE_EXTERNAL))
        else {
            warn!("no external category {unique_id} to remove");
            return false;
        };
        if let CategoryBacking::External { pending_kill, .. } = &mut record.backing {
            *pending_kill = true;
        }
        self.pending.discover = true;
        true
    }

    pub fn add_external_category_item(
        &mut self,
        unique_id: &str,
        descriptor: PlaceableDescriptor,
    ) -> bool {
        let Some(record) = self
            .managed
            .iter_mut()
            .find(|m| m.unique_id == unique_id && m.traits.contains(CategoryTraits::TYPE_EXTERNAL))
        else {
            warn!("no external category {unique_id} to add an item to");
            return false;
        };
        let CategoryBacking::External { data, .. } = &mut record.backing else {
            return false;
        };
        data.items.push(descriptor);
        record.dirty_content = true;
        self.pending.populate = true;
        true
    }

    // --- notifications ---------------------------------------------------

    pub fn on_panel_event(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::CategoryListChanged => {
                if self.ready {
                    self.import_panel_state();
                }
            }
            PanelEvent::CategoryRefreshed(unique_id) => {
                debug!("panel refreshed category {unique_id}");
            }
            PanelEvent::RecentlyPlacedChanged(entries) => {
                self.settings.recently_placed = entries
                    .into_iter()
                    .map(|entry| RecentPlacement::labelled(entry.factory, entry.object_path))
                    .collect();
                self.pending.save = true;
            }
            PanelEvent::AllPlaceableAssetsChanged => {
                self.mark_trait_dirty(CategoryTraits::TRACK_ASSET, DirtyMask::CONTENT);
                self.pending.refresh_content = true;
            }
            PanelEvent::ItemFilteringChanged => {
                self.pending.refresh_content = true;
            }
        }
    }

    pub fn on_editor_change(&mut self, change: EditorChange) {
        if !self.settings.enable_change_tracking {
            return;
        }
        let traits = match change {
            EditorChange::BlueprintCompiled => CategoryTraits::TRACK_BLUEPRINT,
            EditorChange::AssetsChanged => CategoryTraits::TRACK_ASSET,
            EditorChange::WorldChanged => CategoryTraits::TRACK_WORLD,
        };
        self.mark_trait_dirty(traits, DirtyMask::CONTENT);
    }

    /// The class backing a managed category was edited or recompiled.
    pub fn on_category_class_modified(&mut self, unique_id: &str) {
        if !self.settings.enable_change_tracking {
            return;
        }
        self.mark_category_dirty(unique_id, DirtyMask::ALL);
    }

    /// Routes a settings-UI edit to the matching requested work.
    pub fn on_settings_changed(&mut self, field: SettingsField) {
        match field {
            SettingsField::RecentlyPlaced => {
                self.pending.apply_recent = true;
            }
            SettingsField::EngineCategories => {
                self.pending.update_engine = true;
                self.pending.save = true;
            }
            SettingsField::DynamicCategories => {
                self.pending.discover = true;
                self.pending.save = true;
            }
            SettingsField::StaticCategories => {
                self.pending.discover = true;
                self.pending.save = true;
            }
            SettingsField::CategoryContent => {
                self.mark_trait_dirty(CategoryTraits::TYPE_CONFIG, DirtyMask::ALL);
                self.pending.save = true;
            }
        }
    }

    /// Delivered once by the host when the asset index finishes its initial
    /// scan.
    pub fn on_initial_scan_complete(&mut self) {
        self.pending_asset_load = false;
        self.pending.discover = true;
    }

    pub fn run_command(&mut self, command: PaletteCommand) {
        match command {
            PaletteCommand::DiscoverCategories => {
                self.pending.discover = true;
            }
            PaletteCommand::PopulateCategories => {
                self.mark_trait_dirty(CategoryTraits::TYPE_ANY, DirtyMask::CONTENT);
                self.pending.refresh_content = true;
            }
            PaletteCommand::UpdateCategories => {
                self.mark_trait_dirty(CategoryTraits::TYPE_ANY, DirtyMask::INFO);
            }
            PaletteCommand::UpdateToolbar => {
                self.pending.refresh_toolbar = true;
            }
            PaletteCommand::ClearRecent => {
                self.settings.recently_placed.clear();
                self.pending.apply_recent = true;
                self.pending.save = true;
            }
        }
    }

    pub fn request_discover(&mut self) {
        self.pending.discover = true;
    }

    pub fn request_save(&mut self) {
        self.pending.save = true;
    }
}

fn push_unique(discovered: &mut Vec<ManagedCategory>, record: ManagedCategory) {
    if discovered.iter().any(|d| d.unique_id == record.unique_id) {
        debug!("category {} already discovered by an earlier source", record.unique_id);
        return;
    }
    discovered.push(record);
}
