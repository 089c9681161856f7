mod detection;
mod options;

pub use detection::*;
pub use options::*;
