pub mod history;
pub mod image;
pub mod prompt;

pub use history::*;
pub use image::*;
pub use prompt::*;
