mod deadline;
mod interface;
mod memory;
#[cfg(feature = "redis")]
mod redis;

pub(crate) use deadline::bounded;
pub use interface::*;
pub use memory::*;
#[cfg(feature = "redis")]
pub use self::redis::*;
