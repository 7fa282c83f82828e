use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::settings::PlanSettings;
use crate::core::record::CardRecord;
use crate::error::{PlanError, PlanResult};
use crate::input::Keybindings;

/// Schema revision written by this build.
pub const PLAN_VERSION: u32 = 1;

fn first_version() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardRecord {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Cards", default)]
    pub cards: Vec<CardRecord>,
}

/// The on-disk plan document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanFile {
    /// Files written before versioning carry no key and read as version 1.
    #[serde(rename = "Version", default = "first_version")]
    pub version: u32,
    #[serde(rename = "Boards", default)]
    pub boards: Vec<BoardRecord>,
    #[serde(rename = "Settings", default)]
    pub settings: PlanSettings,
    #[serde(rename = "Keybindings", default, skip_serializing_if = "Option::is_none")]
    pub keybindings: Option<Keybindings>,
}

impl Default for PlanFile {
    fn default() -> Self {
        Self {
            version: PLAN_VERSION,
            boards: Vec::new(),
            settings: PlanSettings::default(),
            keybindings: None,
        }
    }
}

impl PlanFile {
    pub fn from_json(json: &str) -> PlanResult<Self> {
        let plan: PlanFile = serde_json::from_str(json)?;
        if plan.version > PLAN_VERSION {
            return Err(PlanError::VersionMismatch {
                found: plan.version,
                supported: PLAN_VERSION,
            });
        }
        Ok(plan)
    }

    pub fn to_json(&self) -> PlanResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn read_plan(path: &Path) -> PlanResult<PlanFile> {
    if !path.exists() {
        return Err(PlanError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    PlanFile::from_json(&content)
}

/// Sibling temporary file a save is staged in.
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "plan".into());
    path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()))
}

/// Write the plan next to `path` and rename it into place, so a failed save
/// leaves the previous file untouched.
pub fn write_plan(path: &Path, plan: &PlanFile) -> PlanResult<()> {
    let json = plan.to_json()?;
    let staged = staging_path(path);
    if let Err(e) = std::fs::write(&staged, json) {
        let _ = std::fs::remove_file(&staged);
        return Err(e.into());
    }
    if let Err(e) = std::fs::rename(&staged, path) {
        let _ = std::fs::remove_file(&staged);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_plan() -> PathBuf {
        std::env::temp_dir().join(format!("masterplan-{}.plan", uuid::Uuid::new_v4()))
    }

    #[test]
    fn newer_version_is_rejected() {
        let err = PlanFile::from_json(r#"{"Version":7,"Boards":[]}"#).unwrap_err();
        assert!(matches!(err, PlanError::VersionMismatch { found: 7, supported: 1 }));
    }

    #[test]
    fn unversioned_files_read_as_first_version() {
        let plan = PlanFile::from_json(r#"{"Boards":[{"Name":"Main","Cards":[]}]}"#).unwrap();
        assert_eq!(plan.version, 1);
        assert_eq!(plan.boards[0].name, "Main");
        assert_eq!(plan.settings, PlanSettings::default());
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        assert!(matches!(PlanFile::from_json("{ nope"), Err(PlanError::Decode(_))));
    }

    #[test]
    fn missing_file_is_not_found() {
        assert!(matches!(read_plan(&temp_plan()), Err(PlanError::NotFound(_))));
    }

    #[test]
    fn write_then_read() {
        let path = temp_plan();
        let mut plan = PlanFile::default();
        plan.boards.push(BoardRecord {
            name: "Main".into(),
            cards: Vec::new(),
        });
        write_plan(&path, &plan).unwrap();
        assert_eq!(read_plan(&path).unwrap(), plan);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn failed_save_leaves_no_file() {
        let dir = std::env::temp_dir().join(format!("masterplan-missing-{}", uuid::Uuid::new_v4()));
        let path = dir.join("plan.plan");
        assert!(write_plan(&path, &PlanFile::default()).is_err());
        assert!(!path.exists());
    }
}
