//! Persisted plan format: a JSON document with `Version`, `Boards`,
//! `Settings` and `Keybindings`.

pub mod convert;
pub mod file;
pub mod settings;

pub use file::{BoardRecord, PLAN_VERSION, PlanFile, read_plan, write_plan};
pub use settings::{PlanSettings, ShadowQuality};
