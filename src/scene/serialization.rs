use crate::scene::SceneLayout;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

pub fn save_layout_to_file(layout: &SceneLayout, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(layout)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_layout_from_file(path: &Path) -> Result<SceneLayout> {
    let json = std::fs::read_to_string(path)?;
    let layout: SceneLayout = serde_json::from_str(&json)?;
    Ok(layout)
}
