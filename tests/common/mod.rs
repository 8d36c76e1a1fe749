#![allow(dead_code)]

use enhanced_palette::asset_index::{AssetFilter, AssetIndex, AssetMeta, MemoryAssetIndex};
use enhanced_palette::category::{
    CategoryInfo, CategoryProvider, CategoryTracking, DirtyMask, GatherContext, PaletteCategory,
};
use enhanced_palette::descriptor::{FactoryInfo, PlaceableDescriptor, PlacementResolver};
use enhanced_palette::panel::MemoryPanelHandle;
use enhanced_palette::settings::{PaletteSettings, StaticCategoryConfig};
use enhanced_palette::PaletteSubsystem;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

pub const MESH_FACTORY: &str = "/factories/MeshFactory";
pub const ACTOR_FACTORY: &str = "/factories/ActorFactory";

fn tail(path: &str) -> &str {
    path.rsplit(['.', '/']).next().unwrap_or(path)
}

/// Scriptable category implementation. The shared cells let a test mutate the
/// category's items or name after the subsystem has taken ownership of it.
#[derive(Clone)]
pub struct SimpleCategory {
    pub id: String,
    pub display_name: Rc<RefCell<String>>,
    pub sortable: bool,
    pub tracking: CategoryTracking,
    pub update_mask: DirtyMask,
    pub updates: Rc<Cell<usize>>,
    pub items: Rc<RefCell<Vec<PlaceableDescriptor>>>,
    pub auto_order: Option<i32>,
}

impl SimpleCategory {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: Rc::new(RefCell::new(id.to_string())),
            sortable: true,
            tracking: CategoryTracking::default(),
            update_mask: DirtyMask::CONTENT,
            updates: Rc::new(Cell::new(0)),
            items: Rc::new(RefCell::new(Vec::new())),
            auto_order: None,
        }
    }

    pub fn with_items(self, items: Vec<PlaceableDescriptor>) -> Self {
        *self.items.borrow_mut() = items;
        self
    }

    pub fn with_interval(mut self, seconds: f32) -> Self {
        self.tracking.tick_interval = Some(seconds);
        self
    }
}

impl PaletteCategory for SimpleCategory {
    fn unique_id(&self) -> &str {
        &self.id
    }

    fn info(&self) -> CategoryInfo {
        let mut info = CategoryInfo::new(&self.id);
        info.display_name = self.display_name.borrow().clone();
        info.sortable = self.sortable;
        info
    }

    fn tracking(&self) -> CategoryTracking {
        self.tracking
    }

    fn interval_update(&mut self) -> DirtyMask {
        self.updates.set(self.updates.get() + 1);
        self.update_mask
    }

    fn gather_items(&mut self, ctx: &mut GatherContext) {
        if let Some(start) = self.auto_order {
            ctx.set_auto_order(start);
        }
        for descriptor in self.items.borrow().iter() {
            ctx.add(descriptor.clone());
        }
    }
}

type Builder = Rc<dyn Fn() -> Box<dyn PaletteCategory>>;

#[derive(Default)]
struct ProviderState {
    loaded: Vec<String>,
    recognized: Vec<String>,
    builders: HashMap<String, Builder>,
}

/// Shared-state provider so tests can load and unload classes after handing
/// a clone to the subsystem.
#[derive(Clone, Default)]
pub struct TestProvider {
    inner: Rc<RefCell<ProviderState>>,
}

impl TestProvider {
    /// Registers a class that shows up in the loaded-class scan.
    pub fn add_loaded(
        &self,
        class_path: &str,
        builder: impl Fn() -> Box<dyn PaletteCategory> + 'static,
    ) {
        let mut state = self.inner.borrow_mut();
        state.loaded.push(class_path.to_string());
        state.builders.insert(class_path.to_string(), Rc::new(builder));
    }

    /// Registers a class that can be instantiated but is not enumerated,
    /// for dynamic config entries and asset-scan generated classes.
    pub fn add_builder(
        &self,
        class_path: &str,
        builder: impl Fn() -> Box<dyn PaletteCategory> + 'static,
    ) {
        self.inner.borrow_mut().builders.insert(class_path.to_string(), Rc::new(builder));
    }

    /// Marks a parent class path as a category class for the asset scan.
    pub fn recognize(&self, parent_class: &str) {
        self.inner.borrow_mut().recognized.push(parent_class.to_string());
    }

    pub fn unload(&self, class_path: &str) {
        self.inner.borrow_mut().loaded.retain(|c| c != class_path);
    }
}

impl CategoryProvider for TestProvider {
    fn loaded_category_classes(&self) -> Vec<String> {
        self.inner.borrow().loaded.clone()
    }

    fn is_category_class(&self, class_path: &str) -> bool {
        self.inner.borrow().recognized.iter().any(|c| c == class_path)
    }

    fn instantiate(&self, class_path: &str) -> Option<Box<dyn PaletteCategory>> {
        self.inner.borrow().builders.get(class_path).map(|builder| builder())
    }
}

struct ResolverState {
    factories: Vec<String>,
    objects: HashMap<String, AssetMeta>,
}

#[derive(Clone)]
pub struct TestResolver {
    inner: Rc<RefCell<ResolverState>>,
}

impl Default for TestResolver {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ResolverState {
                factories: vec![MESH_FACTORY.to_string(), ACTOR_FACTORY.to_string()],
                objects: HashMap::new(),
            })),
        }
    }
}

impl TestResolver {
    pub fn add_factory(&self, class_path: &str) {
        self.inner.borrow_mut().factories.push(class_path.to_string());
    }

    pub fn add_object(&self, asset: AssetMeta) {
        self.inner.borrow_mut().objects.insert(asset.path.clone(), asset);
    }
}

fn factory_info(class_path: &str) -> FactoryInfo {
    FactoryInfo { class_path: class_path.to_string(), display_name: tail(class_path).to_string() }
}

impl PlacementResolver for TestResolver {
    fn find_factory(&self, factory_class: &str) -> Option<FactoryInfo> {
        self.inner
            .borrow()
            .factories
            .iter()
            .find(|f| f.as_str() == factory_class)
            .map(|f| factory_info(f))
    }

    fn find_factory_for_actor(&self, _actor_class: &str) -> Option<FactoryInfo> {
        Some(factory_info(ACTOR_FACTORY))
    }

    fn find_factory_for_asset(&self, _asset: &AssetMeta) -> Option<FactoryInfo> {
        Some(factory_info(MESH_FACTORY))
    }

    fn load_object(&self, object_path: &str) -> Option<AssetMeta> {
        self.inner.borrow().objects.get(object_path).cloned()
    }
}

/// Shared-state asset index so tests can add or drop assets after handing a
/// clone to the subsystem.
#[derive(Clone, Default)]
pub struct SharedAssetIndex {
    inner: Rc<RefCell<MemoryAssetIndex>>,
}

impl SharedAssetIndex {
    pub fn insert(&self, asset: AssetMeta) {
        self.inner.borrow_mut().insert(asset);
    }

    pub fn remove(&self, path: &str) {
        self.inner.borrow_mut().remove(path);
    }

    pub fn set_scanning(&self, scanning: bool) {
        self.inner.borrow_mut().set_scanning(scanning);
    }
}

impl AssetIndex for SharedAssetIndex {
    fn enumerate(&self, filter: &AssetFilter, visit: &mut dyn FnMut(&AssetMeta)) {
        self.inner.borrow().enumerate(filter, visit);
    }

    fn resolve(&self, path: &str) -> Option<AssetMeta> {
        self.inner.borrow().resolve(path)
    }

    fn is_scanning(&self) -> bool {
        self.inner.borrow().is_scanning()
    }
}

pub struct Fixture {
    pub subsystem: PaletteSubsystem,
    pub panel: MemoryPanelHandle,
    pub provider: TestProvider,
    pub index: SharedAssetIndex,
    pub resolver: TestResolver,
}

impl Fixture {
    pub fn new(settings: PaletteSettings) -> Self {
        Self::build(settings, None)
    }

    pub fn with_settings_path(settings: PaletteSettings, path: PathBuf) -> Self {
        Self::build(settings, Some(path))
    }

    fn build(settings: PaletteSettings, path: Option<PathBuf>) -> Self {
        // Opt-in log output: RUST_LOG=debug cargo test -- --nocapture
        let _ = env_logger::builder().is_test(true).try_init();
        let provider = TestProvider::default();
        let index = SharedAssetIndex::default();
        let resolver = TestResolver::default();
        let mut subsystem = PaletteSubsystem::new(
            settings,
            Box::new(index.clone()),
            Box::new(provider.clone()),
            Box::new(resolver.clone()),
        );
        if let Some(path) = path {
            subsystem = subsystem.with_settings_path(path);
        }
        Self { subsystem, panel: MemoryPanelHandle::new(), provider, index, resolver }
    }

    pub fn attach(&mut self) {
        self.subsystem.attach_panel(Box::new(self.panel.clone()));
    }

    pub fn tick(&mut self) {
        self.subsystem.tick(0.1);
    }
}

pub fn mesh_item() -> PlaceableDescriptor {
    PlaceableDescriptor::factory_class(MESH_FACTORY)
}

pub fn static_category(id: &str, items: Vec<PlaceableDescriptor>) -> StaticCategoryConfig {
    let mut config = StaticCategoryConfig::new(id);
    config.display_name = id.to_string();
    config.items = items;
    config
}
