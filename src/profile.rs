use crate::error::ProfileError;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/uacmix/config.toml";

/// Identity and protocol parameters of the emulated capture device, plus the
/// host paths and service name the controller operates against. Loaded once
/// per run; every field has a built-in default and can be overridden
/// individually from the configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    pub gadget_name: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub device_version: u16,
    pub usb_version: u16,
    pub manufacturer: String,
    pub product: String,
    pub serial: String,
    pub configuration: String,
    pub max_power: u32,
    pub capture_channel_mask: u32,
    pub capture_rate: u32,
    pub capture_sample_size: u32,
    pub volume_min: i32,
    pub volume_max: i32,
    pub volume_res: i32,
    /// Pinned controller name. When absent the first controller enumerated
    /// from `udc_class_dir` is used.
    pub udc: Option<String>,
    pub consumer_unit: String,
    pub configfs_root: PathBuf,
    pub udc_class_dir: PathBuf,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            gadget_name: "uacmix".to_string(),
            vendor_id: 0x1d6b,
            product_id: 0x0104,
            device_version: 0x0100,
            usb_version: 0x0200,
            manufacturer: "uacmix".to_string(),
            product: "UAC2 Capture Gadget".to_string(),
            serial: "0001".to_string(),
            configuration: "UAC2".to_string(),
            max_power: 250,
            capture_channel_mask: 3,
            capture_rate: 48_000,
            capture_sample_size: 2,
            volume_min: -12_800,
            volume_max: 0,
            volume_res: 256,
            udc: None,
            consumer_unit: "camilladsp.service".to_string(),
            configfs_root: PathBuf::from("/sys/kernel/config/usb_gadget"),
            udc_class_dir: PathBuf::from("/sys/class/udc"),
        }
    }
}

impl Profile {
    /// Loads the profile from `explicit` when given, otherwise from
    /// [`DEFAULT_CONFIG_PATH`]. A missing default file is not an error; a
    /// missing explicit file is.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ProfileError> {
        let path = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        match fs::read_to_string(&path) {
            Ok(text) => {
                debug!(path = %path.display(), "loaded profile overrides");
                toml::from_str(&text).map_err(|source| ProfileError::Parse { path, source })
            }
            Err(source) if source.kind() == ErrorKind::NotFound && explicit.is_none() => {
                debug!(path = %path.display(), "no profile overrides, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ProfileError::Read { path, source }),
        }
    }
}
