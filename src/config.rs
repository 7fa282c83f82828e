//! Program-wide settings, shared by every plan.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::input::Keybindings;

/// Longest recent-plan list kept.
pub const RECENT_PLAN_LIMIT: usize = 10;

fn default_target_fps() -> u32 {
    60
}

fn default_screenshots_path() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| PathBuf::from("~/Pictures"))
        .join("MasterPlan")
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("masterplan")
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct MasterPlanConfig {
    #[serde(rename = "RecentPlanList")]
    pub recent_plans: Vec<PathBuf>,
    #[serde(rename = "TargetFPS")]
    pub target_fps: u32,
    #[serde(rename = "ScreenshotsPath")]
    pub screenshots_path: PathBuf,
    #[serde(rename = "AutoloadLastPlan")]
    pub autoload_last_plan: bool,
    #[serde(rename = "SaveWindowPosition")]
    pub save_window_position: bool,
    /// `[x, y, width, height]` of the last window.
    #[serde(rename = "WindowPosition", skip_serializing_if = "Option::is_none")]
    pub window_position: Option<[i32; 4]>,
    #[serde(rename = "DebugLogging")]
    pub debug_logging: bool,
    /// Bindings used when a plan carries none.
    #[serde(rename = "Keybindings", skip_serializing_if = "Option::is_none")]
    pub keybindings: Option<Keybindings>,
}

impl Default for MasterPlanConfig {
    fn default() -> Self {
        Self {
            recent_plans: Vec::new(),
            target_fps: default_target_fps(),
            screenshots_path: default_screenshots_path(),
            autoload_last_plan: false,
            save_window_position: true,
            window_position: None,
            debug_logging: false,
            keybindings: None,
        }
    }
}

impl MasterPlanConfig {
    pub fn default_path() -> PathBuf {
        config_dir().join("settings.json")
    }

    /// Read settings from `path`. A missing or unreadable file gives the
    /// defaults; recent plans that no longer exist are dropped.
    pub fn load(path: &Path) -> Self {
        let mut config: Self = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed settings {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        if config.target_fps == 0 {
            config.target_fps = default_target_fps();
        }
        config.recent_plans.retain(|p| p.exists());
        config
    }

    pub fn save(&self, path: &Path) {
        if let Some(dir) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(dir) {
                log::error!("Failed to create {}: {}", dir.display(), e);
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    log::error!("Failed to save settings: {}", e);
                }
            }
            Err(e) => log::error!("Failed to serialize settings: {}", e),
        }
    }

    /// Move `plan` to the front of the recent list.
    pub fn push_recent(&mut self, plan: &Path) {
        self.recent_plans.retain(|p| p != plan);
        self.recent_plans.insert(0, plan.to_path_buf());
        self.recent_plans.truncate(RECENT_PLAN_LIMIT);
    }

    /// Plan to open at startup, if autoloading is on.
    pub fn autoload_plan(&self) -> Option<&Path> {
        if self.autoload_last_plan {
            self.recent_plans.first().map(PathBuf::as_path)
        } else {
            None
        }
    }

    pub fn keybindings(&self) -> Keybindings {
        self.keybindings.clone().unwrap_or_default().with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("masterplan-config-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = MasterPlanConfig::load(&temp_path("settings.json"));
        assert_eq!(config.target_fps, 60);
        assert!(config.recent_plans.is_empty());
        assert!(config.autoload_plan().is_none());
    }

    #[test]
    fn recent_list_is_capped_and_deduplicated() {
        let mut config = MasterPlanConfig::default();
        for i in 0..12 {
            config.push_recent(Path::new(&format!("/plans/{}.plan", i)));
        }
        config.push_recent(Path::new("/plans/5.plan"));
        assert_eq!(config.recent_plans.len(), RECENT_PLAN_LIMIT);
        assert_eq!(config.recent_plans[0], PathBuf::from("/plans/5.plan"));
        assert_eq!(
            config.recent_plans.iter().filter(|p| p.ends_with("5.plan")).count(),
            1
        );
    }

    #[test]
    fn save_then_load_prunes_vanished_plans() {
        let path = temp_path("settings.json");
        let kept = std::env::temp_dir().join(format!("masterplan-{}.plan", uuid::Uuid::new_v4()));
        std::fs::write(&kept, "{}").unwrap();

        let mut config = MasterPlanConfig {
            autoload_last_plan: true,
            target_fps: 30,
            ..MasterPlanConfig::default()
        };
        config.push_recent(Path::new("/definitely/gone.plan"));
        config.push_recent(&kept);
        config.save(&path);

        let loaded = MasterPlanConfig::load(&path);
        assert_eq!(loaded.target_fps, 30);
        assert_eq!(loaded.recent_plans, vec![kept.clone()]);
        assert_eq!(loaded.autoload_plan(), Some(kept.as_path()));

        let _ = std::fs::remove_file(&kept);
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn keys_use_plan_file_names() {
        let json = serde_json::to_string(&MasterPlanConfig::default()).unwrap();
        assert!(json.contains("\"TargetFPS\":60"));
        assert!(json.contains("\"RecentPlanList\":[]"));
        assert!(!json.contains("\"WindowPosition\""));
        assert!(json.contains("\"SaveWindowPosition\":true"));
    }
}
