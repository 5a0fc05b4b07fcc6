mod composition;
mod source;

pub use composition::*;
pub use source::*;
