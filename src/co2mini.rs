mod assembler;
mod frame;
mod reading;

pub use assembler::*;
pub use frame::*;
pub use reading::*;
