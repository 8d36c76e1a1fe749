use crate::category::CategoryInfo;
use crate::descriptor::PlaceableItem;
use crate::settings::RecentPlacement;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// Opaque handle to one registered item, issued by the panel and redeemed on
/// unregistration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlacementHandle(pub u64);

/// Notification raised by the host panel towards the subsystem. Fed to
/// `PaletteSubsystem::on_panel_event`.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    /// The panel rebuilt or reordered its category list.
    CategoryListChanged,
    /// The panel refreshed one category on its own.
    CategoryRefreshed(String),
    /// The user placed something; the panel's recent list changed.
    RecentlyPlacedChanged(Vec<RecentPlacement>),
    /// The host invalidated every placeable asset.
    AllPlaceableAssetsChanged,
    ItemFilteringChanged,
}

/// The host placement panel as the subsystem sees it.
///
/// `update_category_info` is the single direct-mutation back-channel: info
/// updates are written straight into the panel's registered record instead of
/// going through an unregister/register cycle, so live item handles stay
/// valid.
pub trait PlacementPanel {
    /// Registers a category. Returns false when the panel rejects it (empty
    /// id, or the id is already registered).
    fn register_category(&mut self, info: CategoryInfo) -> bool;

    fn unregister_category(&mut self, unique_id: &str);

    /// Overwrites the registered record in place, keyed by `info.unique_id`.
    /// False when no such category is registered.
    fn update_category_info(&mut self, info: &CategoryInfo) -> bool;

    fn category(&self, unique_id: &str) -> Option<CategoryInfo>;

    fn registered_category_names(&self) -> Vec<String>;

    /// Registers one item under a category; `None` when the category is
    /// unknown.
    fn register_item(&mut self, category_id: &str, item: PlaceableItem) -> Option<PlacementHandle>;

    fn unregister_item(&mut self, handle: PlacementHandle);

    fn recently_placed(&self) -> Vec<RecentPlacement>;

    fn set_recent_list(&mut self, entries: Vec<RecentPlacement>);

    fn set_hidden_categories(&mut self, unique_ids: Vec<String>);

    /// The category set or ordering changed; the toolbar should rebuild.
    fn notify_categories_changed(&mut self);

    /// One category's info was updated in place.
    fn notify_category_refreshed(&mut self, unique_id: &str);

    /// Item content changed; visible tiles should regenerate.
    fn request_content_refresh(&mut self);
}

/// In-memory reference panel. Hosts without a native panel can embed it, and
/// the integration tests observe subsystem behavior through its counters.
#[derive(Default)]
pub struct MemoryPanel {
    categories: Vec<CategoryInfo>,
    items: Vec<(PlacementHandle, String, PlaceableItem)>,
    next_handle: u64,
    recent: Vec<RecentPlacement>,
    hidden: Vec<String>,
    pub categories_changed: usize,
    pub content_refreshes: usize,
    pub refreshed: Vec<String>,
}

impl MemoryPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items_in(&self, category_id: &str) -> Vec<PlaceableItem> {
        self.items
            .iter()
            .filter(|(_, owner, _)| owner == category_id)
            .map(|(_, _, item)| item.clone())
            .collect()
    }

    pub fn category_ids(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.unique_id.clone()).collect()
    }

    pub fn hidden_categories(&self) -> &[String] {
        &self.hidden
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Seeds a host-native category, as if the panel had built it itself.
    pub fn seed_category(&mut self, info: CategoryInfo) {
        self.register_category(info);
    }
}

impl PlacementPanel for MemoryPanel {
    fn register_category(&mut self, info: CategoryInfo) -> bool {
        if info.unique_id.is_empty() {
            return false;
        }
        if self.categories.iter().any(|c| c.unique_id == info.unique_id) {
            return false;
        }
        self.categories.push(info);
        true
    }

    fn unregister_category(&mut self, unique_id: &str) {
        self.categories.retain(|c| c.unique_id != unique_id);
        self.items.retain(|(_, owner, _)| owner != unique_id);
    }

    fn update_category_info(&mut self, info: &CategoryInfo) -> bool {
        match self.categories.iter_mut().find(|c| c.unique_id == info.unique_id) {
            Some(existing) => {
                *existing = info.clone();
                true
            }
            None => false,
        }
    }

    fn category(&self, unique_id: &str) -> Option<CategoryInfo> {
        self.categories.iter().find(|c| c.unique_id == unique_id).cloned()
    }

    fn registered_category_names(&self) -> Vec<String> {
        self.category_ids()
    }

    fn register_item(&mut self, category_id: &str, item: PlaceableItem) -> Option<PlacementHandle> {
        if !self.categories.iter().any(|c| c.unique_id == category_id) {
            return None;
        }
        self.next_handle += 1;
        let handle = PlacementHandle(self.next_handle);
        self.items.push((handle, category_id.to_string(), item));
        Some(handle)
    }

    fn unregister_item(&mut self, handle: PlacementHandle) {
        self.items.retain(|(h, _, _)| *h != handle);
    }

    fn recently_placed(&self) -> Vec<RecentPlacement> {
        self.recent.clone()
    }

    fn set_recent_list(&mut self, entries: Vec<RecentPlacement>) {
        self.recent = entries;
    }

    fn set_hidden_categories(&mut self, unique_ids: Vec<String>) {
        self.hidden = unique_ids;
    }

    fn notify_categories_changed(&mut self) {
        self.categories_changed += 1;
    }

    fn notify_category_refreshed(&mut self, unique_id: &str) {
        self.refreshed.push(unique_id.to_string());
    }

    fn request_content_refresh(&mut self) {
        self.content_refreshes += 1;
    }
}

/// Shared handle to a [`MemoryPanel`], letting a test or host keep observing
/// the panel after handing it to the subsystem.
#[derive(Clone, Default)]
pub struct MemoryPanelHandle(Rc<RefCell<MemoryPanel>>);

impl MemoryPanelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn borrow(&self) -> Ref<'_, MemoryPanel> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, MemoryPanel> {
        self.0.borrow_mut()
    }
}

impl PlacementPanel for MemoryPanelHandle {
    fn register_category(&mut self, info: CategoryInfo) -> bool {
        self.0.borrow_mut().register_category(info)
    }

    fn unregister_category(&mut self, unique_id: &str) {
        self.0.borrow_mut().unregister_category(unique_id);
    }

    fn update_category_info(&mut self, info: &CategoryInfo) -> bool {
        self.0.borrow_mut().update_category_info(info)
    }

    fn category(&self, unique_id: &str) -> Option<CategoryInfo> {
        self.0.borrow().category(unique_id)
    }

    fn registered_category_names(&self) -> Vec<String> {
        self.0.borrow().registered_category_names()
    }

    fn register_item(&mut self, category_id: &str, item: PlaceableItem) -> Option<PlacementHandle> {
        self.0.borrow_mut().register_item(category_id, item)
    }

    fn unregister_item(&mut self, handle: PlacementHandle) {
        self.0.borrow_mut().unregister_item(handle);
    }

    fn recently_placed(&self) -> Vec<RecentPlacement> {
        self.0.borrow().recently_placed()
    }

    fn set_recent_list(&mut self, entries: Vec<RecentPlacement>) {
        self.0.borrow_mut().set_recent_list(entries);
    }

    fn set_hidden_categories(&mut self, unique_ids: Vec<String>) {
        self.0.borrow_mut().set_hidden_categories(unique_ids);
    }

    fn notify_categories_changed(&mut self) {
        self.0.borrow_mut().notify_categories_changed();
    }

    fn notify_category_refreshed(&mut self, unique_id: &str) {
        self.0.borrow_mut().notify_category_refreshed(unique_id);
    }

    fn request_content_refresh(&mut self) {
        self.0.borrow_mut().request_content_refresh();
    }
}
