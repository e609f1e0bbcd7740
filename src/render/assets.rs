//! Icon and background assets
//!
//! Every icon the chart could need is read up front. A missing file is a
//! setup failure: nothing is drawn and nothing is substituted.

use image::DynamicImage;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::classes::ClassSpecRegistry;
use crate::error::{ComparisonError, Result};

/// Extensions tried, in order, for every asset
const ASSET_EXTENSIONS: [&str; 2] = ["png", "jpg"];

lazy_static::lazy_static! {
    static ref SEPARATORS: Regex = Regex::new(r"[^a-z0-9]+").expect("valid separator pattern");
}

/// File-name slug: lowercase, every run of whitespace or punctuation
/// collapsed to a single underscore
pub fn snakify(text: &str) -> String {
    let lowered = text.to_lowercase();
    SEPARATORS
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Locate `<dir>/<stem>.<ext>` for the first extension that exists
pub fn resolve_asset(dir: &Path, stem: &str) -> Result<PathBuf> {
    ASSET_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|path| path.is_file())
        .ok_or_else(|| ComparisonError::UnresolvedAsset {
            name: stem.to_string(),
            dir: dir.to_path_buf(),
        })
}

fn load_asset(dir: &Path, stem: &str) -> Result<DynamicImage> {
    let path = resolve_asset(dir, stem)?;
    debug!("Loading asset {}", path.display());
    Ok(image::open(&path)?)
}

/// Preloaded class icons, (class, spec) icons and the background image
pub struct AssetStore {
    dir: PathBuf,
    icons: HashMap<(String, Option<String>), DynamicImage>,
    background: DynamicImage,
}

impl AssetStore {
    /// Read every icon for `registry` plus the `background_tag` image
    pub fn preload(dir: impl Into<PathBuf>, registry: &ClassSpecRegistry, background_tag: &str) -> Result<Self> {
        let dir = dir.into();
        let mut icons = HashMap::new();

        for entry in registry.entries() {
            let class_slug = snakify(&entry.class_name);
            icons.insert(
                (entry.class_name.clone(), None),
                load_asset(&dir, &class_slug)?,
            );

            for spec in &entry.specs {
                let stem = format!("{}_{}", class_slug, snakify(spec));
                icons.insert(
                    (entry.class_name.clone(), Some(spec.clone())),
                    load_asset(&dir, &stem)?,
                );
            }
        }

        let background = load_asset(&dir, &snakify(background_tag))?;
        Ok(Self {
            dir,
            icons,
            background,
        })
    }

    fn icon(&self, class_name: &str, spec_name: Option<&str>) -> Result<&DynamicImage> {
        self.icons
            .get(&(class_name.to_string(), spec_name.map(str::to_string)))
            .ok_or_else(|| ComparisonError::UnresolvedAsset {
                name: match spec_name {
                    Some(spec) => format!("{}_{}", snakify(class_name), snakify(spec)),
                    None => snakify(class_name),
                },
                dir: self.dir.clone(),
            })
    }

    pub fn class_icon(&self, class_name: &str) -> Result<&DynamicImage> {
        self.icon(class_name, None)
    }

    pub fn spec_icon(&self, class_name: &str, spec_name: &str) -> Result<&DynamicImage> {
        self.icon(class_name, Some(spec_name))
    }

    pub fn background(&self) -> &DynamicImage {
        &self.background
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}
