mod camera;
pub mod frame;
pub mod pick;

pub use camera::Camera;
pub use frame::DrawItem;
pub use pick::{Pickable, Picker, PointerClick};
