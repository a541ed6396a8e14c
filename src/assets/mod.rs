use crate::scene::{FloorSurface, Material};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

/// Decoded texture summary handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub average_rgba: [u8; 4],
}

impl TextureInfo {
    /// Flat mid-grey stand-in for textures that are not ready.
    pub const PLACEHOLDER: Self = Self {
        width: 1,
        height: 1,
        average_rgba: [128, 128, 128, 255],
    };
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextureStatus {
    Loading,
    Ready(TextureInfo),
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to decode texture at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("texture at {path} has no pixels")]
    Empty { path: String },
}

/// What a floor currently shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceAppearance<'a> {
    pub material: &'a Material,
    pub texture: &'a TextureInfo,
    pub placeholder: bool,
    pub opacity: f32,
}

type LoadResult = (String, Result<TextureInfo, AssetError>);

/// Decodes textures on background threads; results are picked up by `poll`
/// on the main thread. Anything not ready resolves to the placeholder.
pub struct TextureCache {
    root: PathBuf,
    entries: HashMap<String, TextureStatus>,
    tx: Sender<LoadResult>,
    rx: Receiver<LoadResult>,
}

impl TextureCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            root: root.into(),
            entries: HashMap::new(),
            tx,
            rx,
        }
    }

    /// Queue a texture for background decoding. Repeated requests are ignored.
    pub fn request(&mut self, path: &str) {
        if self.entries.contains_key(path) {
            return;
        }
        self.entries.insert(path.to_string(), TextureStatus::Loading);
        let full_path = self.root.join(path);
        let key = path.to_string();
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let result = decode_texture(&full_path);
            // Receiver gone means the cache was dropped; nothing to report to.
            let _ = tx.send((key, result));
        });
    }

    /// Apply finished loads. Returns how many textures changed state.
    pub fn poll(&mut self) -> usize {
        let mut changed = 0;
        while let Ok((path, result)) = self.rx.try_recv() {
            let status = match result {
                Ok(info) => {
                    log::info!("texture ready: {} ({}x{})", path, info.width, info.height);
                    TextureStatus::Ready(info)
                }
                Err(err) => {
                    log::warn!("{}; using placeholder", err);
                    TextureStatus::Failed(err.to_string())
                }
            };
            self.entries.insert(path, status);
            changed += 1;
        }
        changed
    }

    pub fn status(&self, path: &str) -> Option<&TextureStatus> {
        self.entries.get(path)
    }

    pub fn pending(&self) -> usize {
        self.entries
            .values()
            .filter(|status| matches!(status, TextureStatus::Loading))
            .count()
    }

    /// Decoded texture, or the placeholder when loading, failed or unknown.
    pub fn resolve(&self, path: &str) -> &TextureInfo {
        match self.status(path) {
            Some(TextureStatus::Ready(info)) => info,
            _ => &TextureInfo::PLACEHOLDER,
        }
    }

    pub fn is_ready(&self, path: &str) -> bool {
        matches!(self.status(path), Some(TextureStatus::Ready(_)))
    }

    pub fn appearance<'a>(&'a self, surface: &'a FloorSurface) -> SurfaceAppearance<'a> {
        let material = surface.assigned_material();
        SurfaceAppearance {
            material,
            texture: self.resolve(&material.texture_path),
            placeholder: !self.is_ready(&material.texture_path),
            opacity: surface.opacity(),
        }
    }
}

fn decode_texture(path: &Path) -> Result<TextureInfo, AssetError> {
    let display = path.display().to_string();
    let image = image::open(path)
        .map_err(|source| AssetError::Decode {
            path: display.clone(),
            source,
        })?
        .to_rgba8();
    let (width, height) = image.dimensions();
    let pixel_count = width as u64 * height as u64;
    if pixel_count == 0 {
        return Err(AssetError::Empty { path: display });
    }
    let mut sums = [0u64; 4];
    for pixel in image.pixels() {
        for (sum, channel) in sums.iter_mut().zip(pixel.0) {
            *sum += channel as u64;
        }
    }
    let average_rgba = sums.map(|sum| (sum / pixel_count) as u8);
    Ok(TextureInfo {
        width,
        height,
        average_rgba,
    })
}
