mod document;
mod model;
mod path;

pub use document::*;
pub use model::*;
pub use path::*;
