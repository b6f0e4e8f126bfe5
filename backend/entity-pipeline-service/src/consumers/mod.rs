pub mod post_events;

pub use post_events::{PostEventsConsumer, PostEventsConsumerConfig};
