//! Admin form data and its validation into store types.

pub mod product;
pub mod settings;

pub use product::ProductForm;
pub use settings::SettingsForm;
