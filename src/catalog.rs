use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::Config;
use crate::error::{Error, Result};

/// One class of the dataset: the subfolder name and its image paths.
#[derive(Debug, Clone)]
pub struct ClassEntry {
    /// Class label, taken from the subfolder name
    pub label: String,
    /// Image paths inside the subfolder, in catalog order
    pub images: Vec<PathBuf>,
}

/// Ordered mapping from class label to image paths.
///
/// Built once from the filesystem and read-only afterwards. The position of a
/// class in the catalog governs its label index in the tensor export.
#[derive(Debug, Clone)]
pub struct Catalog {
    classes: Vec<ClassEntry>,
}

impl Catalog {
    /// Build the catalog for a dataset root folder.
    ///
    /// Each direct subfolder becomes one class; each supported image file inside
    /// a subfolder becomes one sample of that class.
    pub fn build(root: &Path, config: &Config) -> Result<Self> {
        let subfolders = list_subfolders(root, config.sort_entries)?;

        let mut classes = Vec::with_capacity(subfolders.len());
        for subfolder in &subfolders {
            let label = subfolder
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            let images = list_images(subfolder, config)?;
            debug!("class '{}': {} images", label, images.len());
            classes.push(ClassEntry { label, images });
        }

        Ok(Catalog { classes })
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True when no class was found
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Total number of images across all classes
    pub fn total_images(&self) -> usize {
        self.classes.iter().map(|class| class.images.len()).sum()
    }

    /// Iterate over classes in catalog order
    pub fn iter(&self) -> std::slice::Iter<'_, ClassEntry> {
        self.classes.iter()
    }

    /// Class labels in catalog order
    pub fn labels(&self) -> Vec<&str> {
        self.classes.iter().map(|class| class.label.as_str()).collect()
    }

    /// First image of the first class, used as the dimension probe sample
    pub fn first_image(&self) -> Option<&Path> {
        self.classes
            .iter()
            .find_map(|class| class.images.first())
            .map(PathBuf::as_path)
    }
}

/// List the direct subfolders of a dataset root.
pub fn list_subfolders(root: &Path, sort: bool) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::NotFound(format!(
            "dataset folder does not exist: {}",
            root.display()
        )));
    }

    let mut subfolders: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.path())
        .collect();

    if sort {
        subfolders.sort();
    }

    Ok(subfolders)
}

/// List the supported image files directly inside a class subfolder.
pub fn list_images(subfolder: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    if !subfolder.is_dir() {
        return Err(Error::NotFound(format!(
            "class folder does not exist: {}",
            subfolder.display()
        )));
    }

    let mut images: Vec<PathBuf> = fs::read_dir(subfolder)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let path = entry.path();
            path.is_file() && is_supported_image_file(&path, config)
        })
        .map(|entry| entry.path())
        .collect();

    if config.sort_entries {
        images.sort();
    }

    Ok(images)
}

// Check if a file is a supported image format
fn is_supported_image_file(path: &Path, config: &Config) -> bool {
    match path.extension() {
        Some(ext) => config.is_supported_format(&ext.to_string_lossy()),
        None => false,
    }
}

/// Check whether a path points at an existing file.
pub fn is_file(path: &Path) -> bool {
    path.is_file()
}

/// Check whether a path points at an existing folder.
pub fn is_folder(path: &Path) -> bool {
    path.is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_image(path: &Path) {
        // 10x10 solid red square
        let img = image::ImageBuffer::from_fn(10, 10, |_, _| image::Rgb([255u8, 0u8, 0u8]));
        img.save(path).unwrap();
    }

    fn test_config() -> Config {
        Config::default()
    }

    #[test]
    fn test_list_subfolders_missing_root() {
        let result = list_subfolders(Path::new("/no/such/folder"), true);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_list_subfolders_sorted() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("dog")).unwrap();
        fs::create_dir(temp_dir.path().join("cat")).unwrap();
        fs::create_dir(temp_dir.path().join("bird")).unwrap();

        let subfolders = list_subfolders(temp_dir.path(), true).unwrap();
        let names: Vec<_> = subfolders
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["bird", "cat", "dog"]);
    }

    #[test]
    fn test_list_images_skips_non_images() {
        let temp_dir = TempDir::new().unwrap();
        create_test_image(&temp_dir.path().join("a.png"));
        create_test_image(&temp_dir.path().join("b.png"));
        fs::write(temp_dir.path().join("notes.txt"), "text").unwrap();

        let images = list_images(temp_dir.path(), &test_config()).unwrap();
        assert_eq!(images.len(), 2);
    }

    #[test]
    fn test_list_images_missing_folder() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone");
        let result = list_images(&missing, &test_config());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_catalog_counts() {
        let temp_dir = TempDir::new().unwrap();
        let cat_dir = temp_dir.path().join("cat");
        let dog_dir = temp_dir.path().join("dog");
        fs::create_dir(&cat_dir).unwrap();
        fs::create_dir(&dog_dir).unwrap();
        create_test_image(&cat_dir.join("a.png"));
        create_test_image(&cat_dir.join("b.png"));
        create_test_image(&dog_dir.join("c.png"));

        let catalog = Catalog::build(temp_dir.path(), &test_config()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.total_images(), 3);
        assert_eq!(catalog.labels(), vec!["cat", "dog"]);

        let counts: Vec<_> = catalog.iter().map(|class| class.images.len()).collect();
        assert_eq!(counts, vec![2, 1]);
    }

    #[test]
    fn test_first_image_skips_empty_class() {
        let temp_dir = TempDir::new().unwrap();
        let empty_dir = temp_dir.path().join("empty");
        let full_dir = temp_dir.path().join("full");
        fs::create_dir(&empty_dir).unwrap();
        fs::create_dir(&full_dir).unwrap();
        create_test_image(&full_dir.join("a.png"));

        let catalog = Catalog::build(temp_dir.path(), &test_config()).unwrap();
        let probe = catalog.first_image().unwrap();
        assert!(probe.ends_with("full/a.png"));
    }

    #[test]
    fn test_path_probes() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.png");
        create_test_image(&file);

        assert!(is_file(&file));
        assert!(!is_folder(&file));
        assert!(is_folder(temp_dir.path()));
        assert!(!is_file(temp_dir.path()));
    }
}
