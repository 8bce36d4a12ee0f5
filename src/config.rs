use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Image sizing assumption for the dataset
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SizeMode {
    /// Every image shares the same (height, width, depth); required for tensor export
    Constant,
    /// Mixed sizes; tensor export is unavailable (padding is not implemented)
    Variable,
}

impl Default for SizeMode {
    fn default() -> Self {
        SizeMode::Constant
    }
}

/// Available run modes for the application
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Write image path references into the record store
    ExportReferences,
    /// Build the class-column path table and save it as CSV
    ExportTable,
    /// Build the feature/label matrices and print their shapes
    ExportTensor,
}

impl Default for RunMode {
    fn default() -> Self {
        RunMode::ExportTable
    }
}

/// Application configuration structure that matches config.json
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    // Directory paths
    pub dataset_directory: String,
    #[serde(default = "default_store_path")]
    pub store_path: String,
    #[serde(default = "default_table_output")]
    pub table_output: String,

    // Record store settings
    #[serde(default)]
    pub use_db: bool,
    #[serde(default)]
    pub create_store: bool,

    // Catalog settings
    #[serde(default)]
    pub images_size: SizeMode,
    #[serde(default = "default_supported_formats")]
    pub supported_formats: Vec<String>,
    #[serde(default = "default_sort_entries")]
    pub sort_entries: bool,

    // General settings
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // Mode selection
    #[serde(default)]
    pub run_mode: RunMode,
}

// Default functions for parameters
fn default_store_path() -> String {
    "data/references.json".to_string()
}

fn default_table_output() -> String {
    "data/uris.csv".to_string()
}

fn default_supported_formats() -> Vec<String> {
    vec![
        "jpg".to_string(),
        "jpeg".to_string(),
        "png".to_string(),
        "gif".to_string(),
        "bmp".to_string(),
        "webp".to_string(),
    ]
}

fn default_sort_entries() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Get the dataset root directory
    pub fn get_dataset_dir(&self) -> PathBuf {
        PathBuf::from(&self.dataset_directory)
    }

    /// Get the record store document path
    pub fn get_store_path(&self) -> PathBuf {
        PathBuf::from(&self.store_path)
    }

    /// Get the CSV output path for the table export
    pub fn get_table_output(&self) -> PathBuf {
        PathBuf::from(&self.table_output)
    }

    /// Check if a file extension is supported
    pub fn is_supported_format(&self, extension: &str) -> bool {
        self.supported_formats
            .iter()
            .any(|format| format.eq_ignore_ascii_case(extension))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_directory: "data/raw".to_string(),
            store_path: default_store_path(),
            table_output: default_table_output(),
            use_db: false,
            create_store: false,
            images_size: SizeMode::Constant,
            supported_formats: default_supported_formats(),
            sort_entries: default_sort_entries(),
            log_level: default_log_level(),
            run_mode: RunMode::ExportTable,
        }
    }
}

/// Load the configuration, creating a default one if it doesn't exist
pub fn load_config() -> Result<Config> {
    let config_path = "config.json";

    if !Path::new(config_path).exists() {
        let default_config = Config::default();
        default_config.save_to_file(config_path)?;
        println!("Created default configuration file: {}", config_path);
    }

    let mut config = Config::from_file(config_path)?;

    // Validate and apply post-load logic
    if config.log_level.is_empty() {
        config.log_level = default_log_level();
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config::default();
        config.save_to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();

        assert_eq!(loaded.dataset_directory, config.dataset_directory);
        assert_eq!(loaded.images_size, SizeMode::Constant);
        assert_eq!(loaded.run_mode, RunMode::ExportTable);
        assert!(loaded.sort_entries);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "dataset_directory": "data/pets" }"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.dataset_directory, "data/pets");
        assert!(!config.use_db);
        assert!(config.is_supported_format("PNG"));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_supported_format_is_case_insensitive() {
        let config = Config::default();
        assert!(config.is_supported_format("jpg"));
        assert!(config.is_supported_format("JPEG"));
        assert!(!config.is_supported_format("txt"));
    }
}
