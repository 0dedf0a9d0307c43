pub mod broadcast_window;
pub mod position;
pub mod snapshot;
pub mod video;
