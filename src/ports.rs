pub mod push;
pub mod time;

pub use push::PushSender;
pub use time::TimeProvider;
