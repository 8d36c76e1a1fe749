pub mod asset_index;
pub mod category;
pub mod descriptor;
pub mod panel;
pub mod settings;
pub mod subsystem;

pub use subsystem::{EditorChange, PaletteCommand, PaletteSubsystem};
