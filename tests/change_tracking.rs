mod common;

use common::{mesh_item, static_category, Fixture, SimpleCategory};
use enhanced_palette::descriptor::PlaceableDescriptor;
use enhanced_palette::panel::{PanelEvent, PlacementPanel};
use enhanced_palette::settings::PaletteSettings;
use enhanced_palette::EditorChange;

fn tracked_fixture(enable_change_tracking: bool) -> (Fixture, SimpleCategory) {
    let mut category = SimpleCategory::new("Tracked").with_items(vec![mesh_item()]);
    category.tracking.asset_changes = true;
    category.tracking.blueprint_changes = true;

    let mut settings = PaletteSettings::default();
    settings.enable_change_tracking = enable_change_tracking;
    let mut fx = Fixture::new(settings);
    fx.resolver.add_factory("/factories/Light");
    let template = category.clone();
    fx.provider.add_loaded("/classes/Tracked", move || Box::new(template.clone()));
    fx.attach();
    fx.tick();
    (fx, category)
}

#[test]
fn editor_change_rebuilds_tracking_categories() {
    let (mut fx, category) = tracked_fixture(true);
    assert_eq!(fx.panel.borrow().items_in("Tracked").len(), 1);

    category.items.borrow_mut().push(PlaceableDescriptor::factory_class("/factories/Light"));
    fx.subsystem.on_editor_change(EditorChange::AssetsChanged);
    fx.tick();

    assert_eq!(fx.panel.borrow().items_in("Tracked").len(), 2);
}

#[test]
fn editor_change_honors_tracking_toggle() {
    let (mut fx, category) = tracked_fixture(false);

    category.items.borrow_mut().push(PlaceableDescriptor::factory_class("/factories/Light"));
    fx.subsystem.on_editor_change(EditorChange::AssetsChanged);
    fx.subsystem.on_editor_change(EditorChange::BlueprintCompiled);
    fx.tick();

    assert_eq!(fx.panel.borrow().items_in("Tracked").len(), 1);
}

#[test]
fn untracked_changes_leave_category_alone() {
    let (mut fx, category) = tracked_fixture(true);

    category.items.borrow_mut().push(PlaceableDescriptor::factory_class("/factories/Light"));
    // The category does not track world changes.
    fx.subsystem.on_editor_change(EditorChange::WorldChanged);
    fx.tick();

    assert_eq!(fx.panel.borrow().items_in("Tracked").len(), 1);
}

#[test]
fn all_assets_changed_event_rebuilds_and_refreshes() {
    let (mut fx, category) = tracked_fixture(true);
    let refreshes_before = fx.panel.borrow().content_refreshes;

    category.items.borrow_mut().push(PlaceableDescriptor::factory_class("/factories/Light"));
    fx.subsystem.on_panel_event(PanelEvent::AllPlaceableAssetsChanged);
    fx.tick();

    assert_eq!(fx.panel.borrow().items_in("Tracked").len(), 2);
    assert!(fx.panel.borrow().content_refreshes > refreshes_before);
}

#[test]
fn filtering_event_only_refreshes_content() {
    let (mut fx, _category) = tracked_fixture(true);
    let refreshes_before = fx.panel.borrow().content_refreshes;

    fx.subsystem.on_panel_event(PanelEvent::ItemFilteringChanged);
    fx.tick();

    assert_eq!(fx.panel.borrow().content_refreshes, refreshes_before + 1);
    assert_eq!(fx.panel.borrow().items_in("Tracked").len(), 1);
}

#[test]
fn category_class_modified_rebuilds_content_and_info() {
    let category = SimpleCategory::new("Edited").with_items(vec![mesh_item()]);
    let display_name = category.display_name.clone();
    let items = category.items.clone();

    let mut fx = Fixture::new(PaletteSettings::default());
    fx.resolver.add_factory("/factories/Light");
    let template = category.clone();
    fx.provider.add_loaded("/classes/Edited", move || Box::new(template.clone()));
    fx.attach();
    fx.tick();

    *display_name.borrow_mut() = "Edited v2".to_string();
    items.borrow_mut().push(PlaceableDescriptor::factory_class("/factories/Light"));
    fx.subsystem.on_category_class_modified("Edited");
    fx.tick();

    assert_eq!(fx.panel.borrow().items_in("Edited").len(), 2);
    assert_eq!(fx.panel.borrow().category("Edited").unwrap().display_name, "Edited v2");
}

#[test]
fn recently_placed_event_persists_into_settings() {
    let (mut fx, _category) = tracked_fixture(true);

    fx.subsystem.on_panel_event(PanelEvent::RecentlyPlacedChanged(vec![
        enhanced_palette::settings::RecentPlacement {
            display_label: String::new(),
            factory: common::MESH_FACTORY.to_string(),
            object_path: None,
        },
    ]));

    let recent = &fx.subsystem.settings().recently_placed;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].display_label, "F=MeshFactory O=");
}

#[test]
fn shutdown_unregisters_everything() {
    let mut settings = PaletteSettings::default();
    settings.static_categories.push(static_category("Props", vec![mesh_item()]));

    let mut fx = Fixture::new(settings);
    fx.attach();
    fx.tick();
    assert_eq!(fx.panel.borrow().item_count(), 1);

    fx.subsystem.shutdown();
    assert!(!fx.subsystem.is_ready());
    assert!(fx.subsystem.managed_ids().is_empty());
    assert!(fx.panel.borrow().category_ids().is_empty());
    assert_eq!(fx.panel.borrow().item_count(), 0);

    // A fresh attach rebuilds from scratch.
    fx.attach();
    fx.tick();
    assert_eq!(fx.panel.borrow().items_in("Props").len(), 1);
}
