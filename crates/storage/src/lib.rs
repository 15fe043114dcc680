// memrank Storage Layer
//
// Read-only memory source interface with an in-memory backend

pub mod memory;
pub mod trait_;

pub use memory::*;
pub use trait_::*;
