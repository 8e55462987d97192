//! Icon images and icon lookup
//!
//! Window icons arrive from the backend as ARGB32 cardinals, themed icons
//! are read from disk. Both end up as an [`IconImage`] holding RGBA pixels.
//! Anything that fails to load is replaced with the generated
//! "image-missing" placeholder so a node never paints empty.

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use linicon::{IconPath, IconType};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Name of the placeholder substituted for icons that cannot be loaded
pub const MISSING_ICON_NAME: &str = "image-missing";

/// Icon loading errors
#[derive(Error, Debug)]
pub enum IconError {
    #[error("icon '{0}' not found in any search path")]
    NotFound(String),

    #[error("failed to decode icon {path:?}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("icon has no pixel data")]
    Empty,
}

/// Decoded icon pixels (RGBA8)
#[derive(Debug, Clone, PartialEq)]
pub struct IconImage {
    name: String,
    pixels: RgbaImage,
}

impl IconImage {
    pub fn new(name: impl Into<String>, pixels: RgbaImage) -> Self {
        Self {
            name: name.into(),
            pixels,
        }
    }

    /// Build an icon from `_NET_WM_ICON`-style ARGB32 pixels
    pub fn from_argb(width: u32, height: u32, argb: &[u32]) -> Result<Self, IconError> {
        let count = (width as usize).saturating_mul(height as usize);
        if count == 0 || argb.len() < count {
            return Err(IconError::Empty);
        }

        let pixels = RgbaImage::from_fn(width, height, |x, y| {
            let p = argb[(y * width + x) as usize];
            Rgba([(p >> 16) as u8, (p >> 8) as u8, p as u8, (p >> 24) as u8])
        });
        Ok(Self::new("window-icon", pixels))
    }

    /// Magenta/black checkerboard used when an icon is unavailable
    pub fn missing(size: u32) -> Self {
        let size = size.max(1);
        let cell = (size / 4).max(1);
        let pixels = RgbaImage::from_fn(size, size, |x, y| {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                Rgba([255, 0, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        });
        Self::new(MISSING_ICON_NAME, pixels)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn is_placeholder(&self) -> bool {
        self.name == MISSING_ICON_NAME
    }

    /// Rasterize into a `size`×`size` box keeping the aspect ratio
    pub fn scaled(&self, size: u32) -> IconImage {
        let size = size.max(1);
        let (w, h) = (self.width().max(1), self.height().max(1));
        if w == size && h <= size || h == size && w <= size {
            return self.clone();
        }

        let (tw, th) = if w >= h {
            (size, ((h as f32 * size as f32 / w as f32).round() as u32).max(1))
        } else {
            (((w as f32 * size as f32 / h as f32).round() as u32).max(1), size)
        };
        let pixels = image::imageops::resize(&self.pixels, tw, th, FilterType::Triangle);
        IconImage::new(self.name.clone(), pixels)
    }
}

/// Source of named icons
pub trait IconLoader {
    fn load(&self, name: &str, size: u32) -> Result<IconImage, IconError>;

    /// Load an icon or fall back to the placeholder, logging the failure
    fn load_or_placeholder(&self, name: &str, size: u32) -> IconImage {
        match self.load(name, size) {
            Ok(icon) => icon,
            Err(e) => {
                warn!("Failed to load icon '{}': {}, using placeholder", name, e);
                IconImage::missing(size)
            }
        }
    }
}

/// Resolves icon names through freedesktop icon themes, then plain pixmap dirs
///
/// Themes are tried in order; inherited themes and `hicolor` are followed
/// by the lookup itself. When no directory matches the requested size the
/// nearest size is taken and rescaled. Scalable (SVG) entries are skipped.
#[derive(Debug, Clone)]
pub struct ThemeIconLoader {
    /// Theme roots, the lookup's XDG defaults when empty
    search_paths: Vec<PathBuf>,
    pixmap_paths: Vec<PathBuf>,
    themes: Vec<String>,
}

impl ThemeIconLoader {
    pub fn new(search_paths: Vec<PathBuf>, themes: Vec<String>) -> Self {
        Self {
            pixmap_paths: search_paths.clone(),
            search_paths,
            themes,
        }
    }

    /// XDG icon directories with the hicolor fallback theme
    pub fn with_default_paths() -> Self {
        Self {
            search_paths: Vec::new(),
            pixmap_paths: vec![PathBuf::from("/usr/share/pixmaps")],
            themes: vec!["hicolor".to_string()],
        }
    }

    fn lookup(&self, theme: &str, name: &str, size: Option<u16>) -> Vec<IconPath> {
        let mut builder = linicon::lookup_icon(name)
            .from_theme(theme)
            .use_fallback_themes(true);
        if let Some(size) = size {
            builder = builder.with_size(size);
        }
        if !self.search_paths.is_empty() {
            let search_paths: Vec<String> = self
                .search_paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            builder = match builder.with_search_paths(search_paths.as_slice()) {
                Ok(builder) => builder,
                Err(e) => {
                    debug!("Icon search paths {:?} rejected: {}", self.search_paths, e);
                    return Vec::new();
                }
            };
        }

        let mut found = Vec::new();
        for entry in builder {
            match entry {
                Ok(icon) if matches!(icon.icon_type, IconType::SVG) => {}
                Ok(icon) => found.push(icon),
                Err(e) => debug!("Icon theme '{}' lookup for '{}': {}", theme, name, e),
            }
        }
        found
    }

    /// Best themed file for `name`: an exact size match, else the nearest size
    fn resolve(&self, name: &str, size: u32) -> Option<PathBuf> {
        let wanted = u16::try_from(size).unwrap_or(u16::MAX);
        for theme in &self.themes {
            if let Some(icon) = self.lookup(theme, name, Some(wanted)).into_iter().next() {
                return Some(icon.path);
            }
            let nearest = self
                .lookup(theme, name, None)
                .into_iter()
                .min_by_key(|icon| size_distance(icon, wanted));
            if let Some(icon) = nearest {
                return Some(icon.path);
            }
        }

        self.pixmap_paths
            .iter()
            .flat_map(|dir| ["png", "jpg"].map(|ext| dir.join(format!("{}.{}", name, ext))))
            .find(|path| path.is_file())
    }

    fn decode(path: &Path, size: u32) -> Result<IconImage, IconError> {
        let decoded = image::open(path).map_err(|source| IconError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(IconImage::new(name, decoded.to_rgba8()).scaled(size))
    }
}

/// How far `wanted` lies outside the sizes an entry covers
fn size_distance(icon: &IconPath, wanted: u16) -> u16 {
    if wanted < icon.min_size {
        icon.min_size - wanted
    } else {
        wanted.saturating_sub(icon.max_size)
    }
}

impl IconLoader for ThemeIconLoader {
    fn load(&self, name: &str, size: u32) -> Result<IconImage, IconError> {
        let path = Path::new(name);
        if path.is_absolute() {
            return Self::decode(path, size);
        }

        match self.resolve(name, size) {
            Some(path) => {
                debug!("Resolved icon '{}' to {:?}", name, path);
                Self::decode(&path, size)
            }
            None => Err(IconError::NotFound(name.to_string())),
        }
    }
}
