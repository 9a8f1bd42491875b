pub mod activity;
pub mod catalog;
pub mod registry;
pub mod service;

pub use activity::Activity;
pub use catalog::{CatalogError, load_catalog, parse_catalog_toml, seed_registry};
pub use registry::{Action, ActivityRegistry, Confirmation, RegistryError};
pub use service::SignupService;
