//! Player Adapter - 播放器实现

mod headless_player;

pub use headless_player::{probe_duration, HeadlessPlayer, HeadlessPlayerFactory};
