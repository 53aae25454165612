//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod player;
pub mod storage;
pub mod tts;

pub use player::*;
pub use storage::*;
pub use tts::*;
