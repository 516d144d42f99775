pub mod ids;
pub mod time;

pub use self::ids::new_id;
pub use self::time::{now_timestamp, timestamp_from_millis};
