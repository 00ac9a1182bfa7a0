pub mod body;
pub mod plugin;
pub mod rules;
pub mod spawn;

pub use plugin::StagePlugin;
