//! Shared test mocks and utilities for the stock change relay.

mod event;
mod feed;
mod hq;
mod sink;
mod source;

pub use event::sample_event;
pub use feed::{FailingFeed, StaticFeed};
pub use hq::{CapturedRequest, MockHq};
pub use sink::{FailingSink, RecordingSink};
pub use source::{ChangeSourceHandle, ChannelChangeSource};
