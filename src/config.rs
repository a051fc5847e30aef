use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::decode::FileBackend;
use crate::error::{Error, Result};
use crate::processing::resample::ResampleFilter;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    #[serde(default = "Configuration::default_box_width")]
    pub box_width: u32,
    #[serde(default = "Configuration::default_box_height")]
    pub box_height: u32,
    #[serde(default)]
    pub resample_filter: ResampleFilter,
    /// Use DCT-domain scaling when the source is a JPEG.
    #[serde(default = "Configuration::default_jpeg_fast_path")]
    pub jpeg_fast_path: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            box_width: Self::default_box_width(),
            box_height: Self::default_box_height(),
            resample_filter: ResampleFilter::default(),
            jpeg_fast_path: Self::default_jpeg_fast_path(),
        }
    }
}

impl Configuration {
    const fn default_box_width() -> u32 {
        1920
    }

    const fn default_box_height() -> u32 {
        1080
    }

    const fn default_jpeg_fast_path() -> bool {
        true
    }

    pub fn validate(&self) -> Result<()> {
        if self.box_width == 0 || self.box_height == 0 {
            return Err(Error::InvalidArgument(format!(
                "box-width and box-height must be positive, got {}x{}",
                self.box_width, self.box_height
            )));
        }
        Ok(())
    }

    pub fn backend(&self) -> FileBackend {
        FileBackend::new(self.resample_filter, self.jpeg_fast_path)
    }
}

/// Load configuration from YAML. A missing file yields the defaults.
pub fn from_yaml_file(path: &Path) -> Result<Configuration> {
    if !path.exists() {
        return Ok(Configuration::default());
    }
    let text = fs::read_to_string(path)?;
    let cfg = serde_yaml::from_str(&text)?;
    Ok(cfg)
}
