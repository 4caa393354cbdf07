use serde::{Deserialize, Serialize};

/// Colours used to encode resource changes.
///
/// Values are Graphviz colour names, so scheme-relative names such as
/// `/paired10/2` work as well as `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Palette {
    pub modified: String,
    pub added: String,
    pub removed: String,
    pub imported: String,
    pub dynamic: String,
    pub used_parameter: String,
    pub maybe_replaced_fill: String,
    pub replaced_fill: String,
    pub removed_fill: String,
}

impl Palette {
    pub fn paired() -> Self {
        Self {
            modified: "/paired10/2".to_string(),
            added: "/paired10/4".to_string(),
            removed: "/paired10/6".to_string(),
            imported: "/paired10/8".to_string(),
            dynamic: "/paired10/12".to_string(),
            used_parameter: "/paired10/10".to_string(),
            maybe_replaced_fill: "/paired10/1".to_string(),
            replaced_fill: "/paired10/2".to_string(),
            removed_fill: "/paired10/5".to_string(),
        }
    }

    pub fn monochrome() -> Self {
        Self {
            modified: "black".to_string(),
            added: "black".to_string(),
            removed: "black".to_string(),
            imported: "black".to_string(),
            dynamic: "gray40".to_string(),
            used_parameter: "black".to_string(),
            maybe_replaced_fill: "gray90".to_string(),
            replaced_fill: "gray75".to_string(),
            removed_fill: "gray60".to_string(),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::paired()
    }
}
