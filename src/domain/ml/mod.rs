pub mod bundle;
pub mod feature_registry;
