use crate::builder::BuildOptions;
use crate::graph::RankDir;
use crate::theme::Palette;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_ENGINE: &str = "dot";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Graphviz layout engine (`dot`, `neato`, `fdp`, `sfdp`, `circo`, `twopi`, ...).
    pub engine: String,
    pub rank_dir: RankDir,
    /// Value of the `overlap` graph attribute for force-directed engines.
    pub overlap: String,
}

impl LayoutConfig {
    pub fn is_force_directed(&self) -> bool {
        matches!(self.engine.as_str(), "fdp" | "sfdp")
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            engine: DEFAULT_ENGINE.to_string(),
            rank_dir: RankDir::LeftRight,
            // Keep overlaps; removing them needs a Graphviz built with triangulation
            overlap: "true".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    /// Scale factor when rasterizing to PNG.
    pub scale: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub palette: Palette,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Config {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            palette: self.palette.clone(),
            rank_dir: self.layout.rank_dir,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    engine: Option<String>,
    rank_dir: Option<String>,
    overlap: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    /// Named palette, `paired` or `monochrome`; `palette` entries apply on top.
    theme: Option<String>,
    palette: Option<serde_json::Value>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfig>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = json5::from_str(&contents)?;

    if let Some(theme) = parsed.theme.as_deref() {
        config.palette = match theme {
            "paired" | "default" => Palette::paired(),
            "monochrome" | "mono" => Palette::monochrome(),
            other => return Err(anyhow::anyhow!("unknown theme {other:?}")),
        };
    }

    if let Some(overrides) = parsed.palette {
        let mut merged = serde_json::to_value(&config.palette)?;
        if let (Some(base), Some(overrides)) = (merged.as_object_mut(), overrides.as_object()) {
            for (key, value) in overrides {
                base.insert(key.clone(), value.clone());
            }
        }
        config.palette = serde_json::from_value(merged)?;
    }

    if let Some(layout) = parsed.layout {
        if let Some(engine) = layout.engine {
            config.layout.engine = engine;
        }
        if let Some(token) = layout.rank_dir {
            config.layout.rank_dir = RankDir::from_token(&token)
                .ok_or_else(|| anyhow::anyhow!("unknown rank direction {token:?}"))?;
        }
        if let Some(overlap) = layout.overlap {
            config.layout.overlap = overlap;
        }
    }

    if let Some(render) = parsed.render {
        config.render = render;
    }

    Ok(config)
}
