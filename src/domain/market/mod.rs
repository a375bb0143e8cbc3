// Daily history and engineered feature rows
pub mod types;
