mod scheduler;
mod subscription;
mod view;

pub use scheduler::{Scheduler, State, TickToken, DEFAULT_INTERVAL};
pub use subscription::{FeedUpdate, Subscriber, SubscriptionId, SubscriptionManager};
pub use view::LogFeed;
