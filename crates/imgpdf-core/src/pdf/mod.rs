mod builder;
mod embed;

pub use builder::DocumentBuilder;
pub use embed::{ImageXObject, image_xobject};
