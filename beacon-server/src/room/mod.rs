mod command;
mod handle;
mod registry;
mod room;

pub use command::*;
pub use handle::*;
pub use registry::*;
