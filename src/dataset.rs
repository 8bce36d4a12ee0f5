use std::env;
use std::path::{Path, PathBuf};

use image::GenericImageView;
use log::{debug, info};
use ndarray::Array2;

use crate::catalog::Catalog;
use crate::config::{Config, SizeMode};
use crate::error::{Error, Result};
use crate::store::RecordStore;
use crate::table::PathTable;

/// Maximum height/width (exclusive) accepted by the tensor export. Keeps an
/// accidental high-resolution dataset from materializing a huge matrix.
const MAX_TENSOR_EDGE: u32 = 50;

/// Dimensions probed from the sample image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleDims {
    pub height: u32,
    pub width: u32,
    pub depth: u32,
}

impl SampleDims {
    /// Length of one flattened image vector
    pub fn flat_len(&self) -> usize {
        self.height as usize * self.width as usize * self.depth as usize
    }
}

/// Converts a folder of labeled image subfolders into dataset projections:
/// store references, a path table, or feature/label matrices.
///
/// The catalog is built once at construction and never mutated; each export
/// recomputes its output from it.
pub struct DatasetBuilder {
    dataset_dir: PathBuf,
    catalog: Catalog,
    store: Option<RecordStore>,
    dims: Option<SampleDims>,
}

impl DatasetBuilder {
    /// Validate the dataset folder, build the catalog, and fix the sample
    /// dimensions when constant-size mode is selected.
    pub fn new(config: &Config) -> Result<Self> {
        if config.dataset_directory.is_empty() {
            return Err(Error::Validation(
                "dataset_directory must not be empty".to_string(),
            ));
        }

        let dataset_dir = config.get_dataset_dir();
        let cwd = env::current_dir()?;
        let same_as_cwd = dataset_dir == cwd
            || dataset_dir
                .canonicalize()
                .map(|resolved| resolved == cwd)
                .unwrap_or(false);
        if same_as_cwd {
            return Err(Error::Validation(
                "dataset folder can't be the working directory".to_string(),
            ));
        }

        if !dataset_dir.is_dir() {
            return Err(Error::Validation(format!(
                "dataset folder does not exist: {}",
                dataset_dir.display()
            )));
        }

        let catalog = Catalog::build(&dataset_dir, config)?;
        info!(
            "catalog built: {} classes, {} images",
            catalog.len(),
            catalog.total_images()
        );

        let store = if config.use_db {
            Some(RecordStore::open(
                config.get_store_path(),
                config.create_store,
            )?)
        } else {
            None
        };

        let dims = match config.images_size {
            SizeMode::Constant => {
                let sample = catalog.first_image().ok_or_else(|| {
                    Error::NotFound(format!(
                        "no image to probe in {}",
                        dataset_dir.display()
                    ))
                })?;
                let dims = probe_dimensions(sample)?;
                debug!(
                    "probed sample {}: {}x{}x{}",
                    sample.display(),
                    dims.height,
                    dims.width,
                    dims.depth
                );
                Some(dims)
            }
            SizeMode::Variable => None,
        };

        Ok(DatasetBuilder {
            dataset_dir,
            catalog,
            store,
            dims,
        })
    }

    /// The validated dataset root
    pub fn dataset_dir(&self) -> &Path {
        &self.dataset_dir
    }

    /// The catalog this builder was constructed over
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Probed sample dimensions, when constant-size mode is active
    pub fn sample_dims(&self) -> Option<SampleDims> {
        self.dims
    }

    /// The record store handle, when persistence is engaged
    pub fn store(&self) -> Option<&RecordStore> {
        self.store.as_ref()
    }

    /// Write every image path reference into the record store, one write per
    /// image, classes in catalog order.
    pub fn export_references_to_store(&mut self) -> Result<()> {
        let store = self.store.as_mut().ok_or_else(|| {
            Error::Precondition(
                "store export requires use_db to be enabled".to_string(),
            )
        })?;

        for class in self.catalog.iter() {
            for image in &class.images {
                store.write(&image.to_string_lossy())?;
            }
        }

        info!(
            "exported {} references to {}",
            self.catalog.total_images(),
            store.path().display()
        );
        Ok(())
    }

    /// Project the catalog as a table: class labels as columns, image paths
    /// as cells. Pure; repeated calls yield identical tables.
    pub fn export_as_table(&self) -> PathTable {
        let labels = self
            .catalog
            .iter()
            .map(|class| class.label.clone())
            .collect();
        let columns = self
            .catalog
            .iter()
            .map(|class| {
                class
                    .images
                    .iter()
                    .map(|path| path.to_string_lossy().to_string())
                    .collect()
            })
            .collect();
        PathTable::new(labels, columns)
    }

    /// Decode every image into a feature matrix of shape
    /// `(height * width * depth, num_images)` and a one-hot label matrix of
    /// shape `(num_classes, num_images)` with identical column order.
    pub fn export_as_tensor(&self) -> Result<(Array2<f32>, Array2<f32>)> {
        let dims = self.dims.ok_or_else(|| {
            Error::Precondition(
                "tensor export requires constant image size mode".to_string(),
            )
        })?;

        if dims.height >= MAX_TENSOR_EDGE || dims.width >= MAX_TENSOR_EDGE {
            return Err(Error::Validation(format!(
                "images of {}x{} are too big for tensor export, try a size below {}x{}",
                dims.height, dims.width, MAX_TENSOR_EDGE, MAX_TENSOR_EDGE
            )));
        }

        let rows = dims.flat_len();
        let num_images = self.catalog.total_images();
        let num_classes = self.catalog.len();

        let mut features = Array2::<f32>::zeros((rows, num_images));
        let mut labels = Array2::<f32>::zeros((num_classes, num_images));

        let mut col = 0;
        for (class_idx, class) in self.catalog.iter().enumerate() {
            for image in &class.images {
                let pixels = flatten_image(image, dims)?;
                for (dst, value) in features.column_mut(col).iter_mut().zip(pixels) {
                    *dst = value;
                }
                labels[[class_idx, col]] = 1.0;
                col += 1;
            }
        }

        info!(
            "tensor export: features {:?}, labels {:?}",
            features.dim(),
            labels.dim()
        );
        Ok((features, labels))
    }
}

/// Probe an image file for (height, width, depth).
fn probe_dimensions(path: &Path) -> Result<SampleDims> {
    let img = image::open(path).map_err(|err| {
        Error::Decode(format!("cannot decode sample {}: {}", path.display(), err))
    })?;
    let (width, height) = img.dimensions();
    let depth = img.color().channel_count() as u32;

    match depth {
        1 | 3 | 4 => Ok(SampleDims {
            height,
            width,
            depth,
        }),
        other => Err(Error::Decode(format!(
            "sample {} has unsupported channel count {}",
            path.display(),
            other
        ))),
    }
}

/// Decode one image and flatten it to `height * width * depth` intensities,
/// row-major, channels interleaved. Raw 0-255 range as `f32`.
fn flatten_image(path: &Path, dims: SampleDims) -> Result<Vec<f32>> {
    let img = image::open(path).map_err(|err| {
        Error::Decode(format!("cannot decode {}: {}", path.display(), err))
    })?;

    let (width, height) = img.dimensions();
    let depth = img.color().channel_count() as u32;
    if height != dims.height || width != dims.width || depth != dims.depth {
        return Err(Error::Shape {
            path: path.display().to_string(),
            expected: format!("{}x{}x{}", dims.height, dims.width, dims.depth),
            actual: format!("{}x{}x{}", height, width, depth),
        });
    }

    let bytes = match depth {
        1 => img.to_luma8().into_raw(),
        3 => img.to_rgb8().into_raw(),
        4 => img.to_rgba8().into_raw(),
        other => {
            return Err(Error::Decode(format!(
                "{} has unsupported channel count {}",
                path.display(),
                other
            )))
        }
    };

    Ok(bytes.into_iter().map(f32::from).collect())
}
