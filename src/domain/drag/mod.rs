//! Drag-and-drop gesture model.

mod gesture;

pub use gesture::{preview_order, DragGesture, DragPhase, GestureEnd};
