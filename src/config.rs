use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::core::select::DEFAULT_P_THRESHOLD;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    #[serde(default = "SearchConfig::default_iterations")]
    pub iterations: usize,
    #[serde(default = "SearchConfig::default_p_threshold")]
    pub p_threshold: f64,
    #[serde(default)]
    pub parallel: bool,
}

impl SearchConfig {
    fn default_iterations() -> usize {
        1000
    }
    fn default_p_threshold() -> f64 {
        DEFAULT_P_THRESHOLD
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            iterations: Self::default_iterations(),
            p_threshold: Self::default_p_threshold(),
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PlotFormat {
    /// One page per plot.
    #[default]
    Pdf,
    Svg,
    Png,
}

impl PlotFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlotConfig {
    #[serde(default = "PlotConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub format: PlotFormat,
    /// Panel width in pixels.
    #[serde(default = "PlotConfig::default_width")]
    pub width: u32,
    /// Panel height in pixels; svg and png stack both panels on one page.
    #[serde(default = "PlotConfig::default_height")]
    pub height: u32,
    #[serde(default = "PlotConfig::default_font_size")]
    pub font_size: u32,
    /// Standard deviation of the horizontal jitter on box-plot points.
    #[serde(default = "PlotConfig::default_jitter_sd")]
    pub jitter_sd: f64,
}

impl PlotConfig {
    fn default_enabled() -> bool {
        true
    }
    fn default_width() -> u32 {
        1400
    }
    fn default_height() -> u32 {
        700
    }
    fn default_font_size() -> u32 {
        30
    }
    fn default_jitter_sd() -> f64 {
        0.1
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            format: PlotFormat::default(),
            width: Self::default_width(),
            height: Self::default_height(),
            font_size: Self::default_font_size(),
            jitter_sd: Self::default_jitter_sd(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub plot: PlotConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.search.iterations == 0 {
            return Err(Error::Config("search.iterations must be at least 1".into()));
        }
        if !(0.0..1.0).contains(&self.search.p_threshold) {
            return Err(Error::Config(format!(
                "search.p_threshold must be in [0, 1), got {}",
                self.search.p_threshold
            )));
        }
        if self.plot.width == 0 || self.plot.height == 0 || self.plot.font_size == 0 {
            return Err(Error::Config(
                "plot.width, plot.height and plot.font_size must be positive".into(),
            ));
        }
        if !(self.plot.jitter_sd >= 0.0 && self.plot.jitter_sd.is_finite()) {
            return Err(Error::Config(format!(
                "plot.jitter_sd must be a finite non-negative number, got {}",
                self.plot.jitter_sd
            )));
        }
        Ok(())
    }

    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            match fs::read_to_string(path_obj) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        warn!("Failed to parse config {path}: {err}. Using defaults.");
                    }
                },
                Err(err) => {
                    warn!("Failed to read config {path}: {err}. Using defaults.");
                }
            }
            return Self::default();
        }

        // File does not exist: write commented-out defaults and return them.
        let default_cfg = Self::default();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                let mut commented = String::new();
                for line in text.lines() {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        commented.push('\n');
                    } else if trimmed.starts_with('[') && trimmed.ends_with(']') {
                        commented.push_str(line);
                        commented.push('\n');
                    } else {
                        commented.push_str("# ");
                        commented.push_str(line);
                        commented.push('\n');
                    }
                }
                if let Err(err) = fs::write(path_obj, commented) {
                    warn!("Failed to write default config to {path}: {err}");
                }
            }
            Err(err) => warn!("Failed to serialize default config: {err}; continuing with defaults"),
        }
        default_cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn unique_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "groupbalance_config_test_{}_{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn load_or_default_writes_defaults_cleanly() {
        let path = unique_path("defaults.toml");
        let path_str = path.to_string_lossy().to_string();
        let _ = fs::remove_file(&path);

        let cfg = AppConfig::load_or_default(&path_str);
        assert!(path.exists(), "config file should be created");
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.search.iterations, 1000);
        assert_eq!(cfg.search.p_threshold, 0.1);
        assert_eq!(cfg.plot.format, PlotFormat::Pdf);

        let contents = fs::read_to_string(&path).expect("read written config");
        assert!(contents.contains("[search]"));
        assert!(contents.contains("# iterations = 1000"));
        assert!(contents.contains("# p_threshold = 0.1"));
        assert!(contents.contains("# format = \"pdf\""));

        // Everything is commented out, so reloading still yields defaults.
        assert_eq!(AppConfig::load_or_default(&path_str), AppConfig::default());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_or_default_reads_existing() {
        let path = unique_path("custom.toml");
        let path_str = path.to_string_lossy().to_string();
        fs::write(
            &path,
            "[search]\niterations = 250\nparallel = true\n\n[plot]\nformat = \"png\"\n",
        )
        .unwrap();

        let cfg = AppConfig::load_or_default(&path_str);
        assert_eq!(cfg.search.iterations, 250);
        assert!(cfg.search.parallel);
        assert_eq!(cfg.search.p_threshold, 0.1);
        assert_eq!(cfg.plot.format, PlotFormat::Png);
        assert_eq!(cfg.plot.width, 1400);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn unparsable_config_falls_back() {
        let path = unique_path("broken.toml");
        fs::write(&path, "[search\niterations = ").unwrap();
        let cfg = AppConfig::load_or_default(&path.to_string_lossy());
        assert_eq!(cfg, AppConfig::default());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        cfg.search.p_threshold = 1.5;
        assert!(cfg.validate().is_err());
        cfg.search.p_threshold = 0.1;
        cfg.search.iterations = 0;
        assert!(cfg.validate().is_err());
        cfg.search.iterations = 10;
        cfg.plot.jitter_sd = f64::NAN;
        assert!(cfg.validate().is_err());
    }
}
