mod builder;
mod item;
mod poller;

pub use builder::PollBuilder;
pub use item::{PollFlags, PollItem, PollSource};
pub use poller::poll;
