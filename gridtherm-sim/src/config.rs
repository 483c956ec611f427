//! Simulator configuration (TOML)
//!
//! Every section is optional; missing values fall back to a 3x7 grid at
//! 21 °C with learning assisted by the simulated operator.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use gridtherm_core::{GridPosition, GridSize, Settings};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub grid: GridConfig,
    pub field: FieldConfig,
    pub network: NetworkConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: u8,
    pub cols: u8,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: GridSize::REFERENCE.rows(),
            cols: GridSize::REFERENCE.cols(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub ambient_c: f32,
    pub max_bias_c: f32,
    pub noise_c: f32,
    pub seed: u64,
    pub unplugged: Vec<[u8; 2]>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            ambient_c: 21.0,
            max_bias_c: 0.4,
            noise_c: 0.03,
            seed: 1,
            unplugged: Vec::new(),
        }
    }
}

impl FieldConfig {
    pub fn unplugged_positions(&self) -> impl Iterator<Item = GridPosition> + '_ {
        self.unplugged
            .iter()
            .map(|[row, col]| GridPosition::new(*row, *col))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub ssid: String,
    pub password: String,
    pub server_url: String,
    pub response: String,
}

impl NetworkConfig {
    /// Settings to seed an empty state file with
    pub fn initial_settings(&self) -> Result<Settings> {
        let mut settings = Settings::default();
        if !self.ssid.is_empty() {
            settings
                .network
                .set_wifi(&self.ssid, &self.password)
                .map_err(|e| anyhow::anyhow!("network: {}", e))?;
        }
        if !self.server_url.is_empty() {
            settings
                .network
                .set_server(&self.server_url)
                .map_err(|e| anyhow::anyhow!("network: {}", e))?;
        }
        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub device_id: String,
    pub state_file: PathBuf,
    pub speed: u32,
    pub auto_learn: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            device_id: "GT-SIM-0001".to_string(),
            state_file: PathBuf::from("gridtherm-sim.state"),
            speed: 1,
            auto_learn: true,
        }
    }
}

impl SimConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(text)?;
        config.grid_size()?;
        if config.run.speed == 0 {
            anyhow::bail!("run.speed must be at least 1");
        }
        Ok(config)
    }

    pub fn grid_size(&self) -> Result<GridSize> {
        GridSize::new(self.grid.rows, self.grid.cols)
            .map_err(|e| anyhow::anyhow!("grid {}x{}: {}", self.grid.rows, self.grid.cols, e))
    }
}
