pub mod creative;
pub mod params;
pub mod queue;

pub use creative::*;
pub use params::*;
pub use queue::*;
