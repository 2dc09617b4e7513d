pub mod penalty;
pub use penalty::*;

pub mod rewards;
pub use rewards::*;
