use serde::{Deserialize, Serialize};

/// Tunables for one controller. Every field has a default, so a config
/// file only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChoreoConfig {
    /// Prefix for every published path and method.
    pub namespace:       String,
    /// Side of the square canvas.
    pub canvas_size:     f64,
    /// Ants created at startup.
    pub initial_count:   usize,
    pub default_size:    f64,
    /// Initial global delay, in ms per stagger index.
    pub default_delay:   f64,
    pub boom_step_delay: f64,
    /// Pause between implode and scatter.
    pub boom_pause:      f64,
    pub implode_size:    f64,
    pub scatter_size:    f64,
}

impl Default for ChoreoConfig {
    fn default() -> Self {
        Self {
            namespace:       "ants".into(),
            canvas_size:     600.0,
            initial_count:   150,
            default_size:    8.0,
            default_delay:   3.0,
            boom_step_delay: 0.1,
            boom_pause:      1000.0,
            implode_size:    1.0,
            scatter_size:    8.0,
        }
    }
}

impl ChoreoConfig {
    /// Load from a JSON file. Missing keys keep their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: ChoreoConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    /// Small canvas, three ants. For unit tests.
    pub fn default_test() -> Self {
        Self {
            canvas_size:   100.0,
            initial_count: 3,
            ..Self::default()
        }
    }
}
