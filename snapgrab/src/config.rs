use anyhow::{Context, Result};
use log::debug;
use once_cell::sync::Lazy;
use platform_dirs::AppDirs;
use screen_grab::{CaptureSettings, DEFAULT_OUTPUT_DIR, DEFAULT_PIPELINE, PREVIEW_BOX, ToolSpec};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

const CARGO_TOML: &str = include_str!("../Cargo.toml");
static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::default()));

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct Config {
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(skip)]
    pub is_first_run: bool,

    #[serde(skip)]
    pub app_name: String,

    #[serde(default)]
    pub preference: Preference,

    #[serde(default)]
    pub capture: Capture,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Preference {
    #[derivative(Default(value = "840"))]
    pub win_width: u32,

    #[derivative(Default(value = "720"))]
    pub win_height: u32,

    #[derivative(Default(value = "PREVIEW_BOX.0"))]
    pub preview_width: u32,

    #[derivative(Default(value = "PREVIEW_BOX.1"))]
    pub preview_height: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Capture {
    /// Relative paths resolve against the working directory
    #[derivative(Default(value = "DEFAULT_OUTPUT_DIR.to_string()"))]
    pub output_dir: String,

    // ms
    #[derivative(Default(value = "1500"))]
    pub delay_ms: u64,

    // ms
    #[derivative(Default(value = "3000"))]
    pub pipeline_timeout_ms: u64,

    #[derivative(Default(value = "DEFAULT_PIPELINE.to_string()"))]
    pub pipeline: String,

    /// Empty means the system temp directory
    pub temp_file: String,

    #[derivative(Default(value = "ToolSpec::gnome_screenshot()"))]
    pub compositor_tool: ToolSpec,

    #[derivative(Default(value = "ToolSpec::imagemagick_import()"))]
    pub external_tool: ToolSpec,
}

impl Capture {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl From<&Capture> for CaptureSettings {
    fn from(capture: &Capture) -> Self {
        let settings = CaptureSettings::default()
            .with_compositor_tool(capture.compositor_tool.clone())
            .with_external_tool(capture.external_tool.clone())
            .with_pipeline(capture.pipeline.clone())
            .with_pipeline_timeout(Duration::from_millis(capture.pipeline_timeout_ms));

        if capture.temp_file.is_empty() {
            settings
        } else {
            settings.with_temp_path(PathBuf::from(&capture.temp_file))
        }
    }
}

impl Config {
    /// Initializes the configuration
    ///
    /// Reads the package name, creates the config directory and loads the
    /// configuration file.
    pub fn init(&mut self) -> Result<()> {
        self.app_name = package_name()?;

        let app_dirs = AppDirs::new(Some(&self.app_name), true)
            .with_context(|| "no config directory on this platform")?;
        self.init_in(&app_dirs.config_dir)
    }

    fn init_in(&mut self, config_dir: &Path) -> Result<()> {
        fs::create_dir_all(config_dir)?;
        self.config_path = config_dir.join(format!("{}.toml", self.app_name));

        self.load().with_context(|| "load config file failed")?;
        debug!("{:?}", self);
        Ok(())
    }

    /// Loads configuration from file or writes the defaults if it is missing
    /// or broken. A broken file is kept as `<name>.toml.bak`.
    fn load(&mut self) -> Result<()> {
        match fs::read_to_string(&self.config_path) {
            Ok(text) => match toml::from_str::<Config>(&text) {
                Ok(mut c) => {
                    c.config_path = self.config_path.clone();
                    c.is_first_run = self.is_first_run;
                    c.app_name = self.app_name.clone();
                    *self = c;

                    Ok(())
                }
                Err(e) => {
                    log::warn!("parse {} failed: {e}", self.config_path.display());

                    if let Some(bak_file) = &self.config_path.as_os_str().to_str() {
                        _ = fs::copy(&self.config_path, format!("{}.bak", bak_file));
                    }

                    self.write_defaults()
                }
            },
            Err(_) => self.write_defaults(),
        }
    }

    fn write_defaults(&mut self) -> Result<()> {
        self.is_first_run = true;

        match toml::to_string_pretty(self) {
            Ok(text) => Ok(fs::write(&self.config_path, text)?),
            Err(e) => Err(e.into()),
        }
    }
}

fn package_name() -> Result<String> {
    let metadata =
        toml::from_str::<toml::Table>(CARGO_TOML).with_context(|| "parse Cargo.toml failed")?;

    metadata
        .get("package")
        .and_then(|p| p.get("name"))
        .and_then(|n| n.as_str())
        .map(|n| n.to_string())
        .with_context(|| "no package name in Cargo.toml")
}

/// Initializes the global configuration
///
/// This should be called once at application startup.
pub fn init() -> Result<()> {
    let mut config = CONFIG.lock().unwrap();
    config.init()
}

/// Returns a clone of the current configuration
pub fn all() -> Config {
    CONFIG.lock().unwrap().clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_in(dir: &Path) -> Result<Config> {
        let mut config = Config {
            app_name: "snapgrab".to_string(),
            ..Default::default()
        };
        config.init_in(dir)?;
        Ok(config)
    }

    #[test]
    fn test_first_run_writes_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = config_in(dir.path())?;

        assert!(config.is_first_run);
        assert!(config.config_path.exists());
        assert_eq!(config.capture.output_dir, "output");
        assert_eq!(config.capture.delay(), Duration::from_millis(1500));
        assert_eq!(
            (config.preference.preview_width, config.preference.preview_height),
            (800, 600)
        );
        Ok(())
    }

    #[test]
    fn test_load_existing_file() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("snapgrab.toml"),
            "[capture]\noutput_dir = \"shots\"\ndelay_ms = 500\n",
        )?;

        let config = config_in(dir.path())?;
        assert!(!config.is_first_run);
        assert_eq!(config.capture.output_dir, "shots");
        assert_eq!(config.capture.delay_ms, 500);
        assert_eq!(config.capture.pipeline_timeout_ms, 3000);
        assert_eq!(config.capture.compositor_tool, ToolSpec::gnome_screenshot());
        Ok(())
    }

    #[test]
    fn test_broken_file_is_backed_up() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("snapgrab.toml");
        fs::write(&path, "capture = [not toml")?;

        let config = config_in(dir.path())?;
        assert!(config.is_first_run);
        assert_eq!(
            fs::read_to_string(dir.path().join("snapgrab.toml.bak"))?,
            "capture = [not toml"
        );
        assert!(toml::from_str::<Config>(&fs::read_to_string(&path)?).is_ok());
        Ok(())
    }

    #[test]
    fn test_capture_settings_from_config() {
        let capture = Capture {
            pipeline_timeout_ms: 250,
            temp_file: "/tmp/grab.png".to_string(),
            ..Default::default()
        };

        let settings = CaptureSettings::from(&capture);
        assert_eq!(settings.pipeline_timeout, Duration::from_millis(250));
        assert_eq!(settings.temp_path, PathBuf::from("/tmp/grab.png"));
        assert_eq!(settings.external_tool, ToolSpec::imagemagick_import());

        let settings = CaptureSettings::from(&Capture::default());
        assert_eq!(settings.temp_path, CaptureSettings::default().temp_path);
    }
}
