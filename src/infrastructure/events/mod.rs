//! Events - 播放事件推送

mod publisher;

pub use publisher::{EventPublisher, PlaybackEvent};
