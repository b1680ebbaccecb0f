//! Layer renderers and the compositor.

pub mod background;
pub mod composite;
pub mod mouth;
pub mod photo;
pub mod surface;
pub mod text;
