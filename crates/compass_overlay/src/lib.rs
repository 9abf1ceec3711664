pub mod camera;
pub mod canvas;
pub mod config;
pub mod headless_canvas;
pub mod label_renderer;
pub mod location;
pub mod map_overlay;
pub mod measurement;
pub mod overlay_arena;
pub mod projector;
mod utils;

#[cfg(test)]
pub(crate) mod test_utils;
