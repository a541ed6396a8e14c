//! roomviz - interactive house preview
//!
//! Click a room divider to fade its spotlight on or off, click a floor to
//! cross-fade it to the other tile material.
//!
//! Usage:
//!   roomviz                        built-in house layout
//!   roomviz <layout.json>          layout loaded from file (textures relative to it)
//!   roomviz --dump-layout <path>   write the built-in layout as JSON and exit

mod app;
mod assets;
mod controller;
mod render;
mod scene;
mod transition;

use scene::serialization::{load_layout_from_file, save_layout_to_file};
use scene::SceneLayout;
use std::path::{Path, PathBuf};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.first().map(String::as_str) == Some("--dump-layout") {
        let Some(path) = args.get(1) else {
            log::error!("--dump-layout needs an output path");
            std::process::exit(2);
        };
        match save_layout_to_file(&SceneLayout::default_house(), Path::new(path)) {
            Ok(()) => log::info!("Wrote default layout to {}", path),
            Err(err) => {
                log::error!("Failed to write {}: {}", path, err);
                std::process::exit(1);
            }
        }
        return;
    }

    let (layout, asset_root) = match args.first() {
        Some(path) => {
            let path = PathBuf::from(path);
            match load_layout_from_file(&path) {
                Ok(layout) => {
                    log::info!("Loaded layout from {}", path.display());
                    let root = path
                        .parent()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| PathBuf::from("."));
                    (layout, root)
                }
                Err(err) => {
                    log::error!("Failed to load {}: {}", path.display(), err);
                    std::process::exit(1);
                }
            }
        }
        None => (SceneLayout::default_house(), PathBuf::from(".")),
    };

    let app = match app::App::new(&layout, asset_root) {
        Ok(app) => app,
        Err(err) => {
            log::error!("Invalid layout: {}", err);
            std::process::exit(1);
        }
    };

    log::info!("roomviz - click rooms to toggle lights, floors to swap tiles");
    log::info!("   Press ESC or close window to exit");

    if let Err(err) = app::run(app) {
        log::error!("Event loop error: {}", err);
        std::process::exit(1);
    }

    log::info!("Goodbye!");
}
