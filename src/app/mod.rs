mod input;
mod timing;

use crate::assets::TextureCache;
use crate::controller::{ToggleController, ToggleOutcome};
use crate::scene::{EntityId, RegistryError, SceneLayout};
use input::PointerState;
use timing::FrameTiming;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::error::EventLoopError;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorIcon, Window, WindowAttributes, WindowId};

const BASE_TITLE: &str = "roomviz";

pub struct App {
    window: Option<Arc<Window>>,
    controller: ToggleController,
    textures: TextureCache,
    pointer: PointerState,
    timing: FrameTiming,
    viewport: PhysicalSize<u32>,
    hovered: Option<EntityId>,
    close_requested: bool,
}

impl App {
    pub fn new(layout: &SceneLayout, asset_root: PathBuf) -> Result<Self, RegistryError> {
        let scene = layout.build()?;
        if scene.registry.is_empty() {
            log::warn!("layout has no rooms or floors; clicks will do nothing");
        }
        let mut textures = TextureCache::new(asset_root);
        for path in layout.texture_paths() {
            textures.request(&path);
        }
        Ok(Self {
            window: None,
            controller: ToggleController::new(scene),
            textures,
            pointer: PointerState::default(),
            timing: FrameTiming::new(Instant::now()),
            viewport: PhysicalSize::new(1280, 720),
            hovered: None,
            close_requested: false,
        })
    }

    fn handle_click(&mut self, click: &crate::render::PointerClick) {
        match self.controller.handle_click(click) {
            ToggleOutcome::NoSelection => {}
            ToggleOutcome::Started { entity, kind, .. } => {
                if let Some(resolved) = self.controller.registry().get(entity) {
                    log::debug!("clicked {:?} '{}'", kind, resolved.name);
                }
            }
        }
    }

    fn viewport(&self) -> (u32, u32) {
        (self.viewport.width, self.viewport.height)
    }

    /// Pointer cursor over anything clickable.
    fn update_hover(&mut self) {
        let hovered = self
            .pointer
            .sample(self.viewport())
            .and_then(|sample| self.controller.hovered(&sample))
            .map(|entity| entity.id);
        if hovered == self.hovered {
            return;
        }
        self.hovered = hovered;
        if let Some(window) = &self.window {
            window.set_cursor(if hovered.is_some() {
                CursorIcon::Pointer
            } else {
                CursorIcon::Default
            });
        }
    }

    fn frame(&mut self) {
        let (elapsed_ms, refresh_title) = self.timing.update(Instant::now());
        if self.textures.poll() > 0 {
            self.log_floor_appearance();
        }
        self.controller.update(elapsed_ms);

        if refresh_title {
            if log::log_enabled!(log::Level::Trace) {
                for item in self.controller.draw_list(&self.textures, self.viewport()) {
                    log::trace!("{}", item);
                }
            }
            if let Some(window) = &self.window {
                window.set_title(&self.title());
            }
        }
    }

    fn log_floor_appearance(&self) {
        for entity in self.controller.registry().entities() {
            if let Some(surface) = entity.surface() {
                let appearance = self.textures.appearance(surface);
                log::debug!(
                    "{}: {} ({}x{}{})",
                    entity.name,
                    appearance.material.name,
                    appearance.texture.width,
                    appearance.texture.height,
                    if appearance.placeholder { ", placeholder" } else { "" }
                );
            }
        }
    }

    fn title(&self) -> String {
        let mut title = format!(
            "{} - {:.1} fps - {}",
            BASE_TITLE,
            self.timing.fps(),
            self.controller.status()
        );
        if let Some(hovered) = self.hovered {
            let items = self.controller.draw_list(&self.textures, self.viewport());
            if let Some(item) = items.iter().find(|item| item.entity == hovered) {
                title.push_str(&format!(" | {} {:.0}%", item.name, item.level * 100.0));
            }
        }
        let pending = self.textures.pending();
        if pending > 0 {
            title.push_str(&format!(" | loading {} textures", pending));
        }
        title
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(BASE_TITLE)
            .with_inner_size(self.viewport)
            .with_resizable(true);

        match event_loop.create_window(window_attrs) {
            Ok(window) => {
                self.viewport = window.inner_size();
                log::info!(
                    "Window created: {}x{}",
                    self.viewport.width,
                    self.viewport.height
                );
                self.window = Some(Arc::new(window));
            }
            Err(err) => {
                log::error!("failed to create window: {}", err);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down...");
                self.close_requested = true;
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    log::info!("Escape pressed, shutting down...");
                    self.close_requested = true;
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(new_size) => {
                log::debug!("Window resized to {}x{}", new_size.width, new_size.height);
                self.viewport = new_size;
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer.handle_cursor_moved(position.x, position.y);
                self.update_hover();
            }
            WindowEvent::CursorLeft { .. } => {
                self.pointer.handle_cursor_left();
                self.update_hover();
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let viewport = self.viewport();
                if let Some(click) = self.pointer.handle_button(button, state, viewport) {
                    self.handle_click(&click);
                }
            }
            WindowEvent::RedrawRequested => {
                self.frame();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.close_requested {
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

pub fn run(mut app: App) -> Result<(), EventLoopError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop.run_app(&mut app)
}
