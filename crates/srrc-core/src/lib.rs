pub mod error;
pub mod event;
pub mod id;
pub mod time;

pub use error::{CoreError, Result};
pub use event::{Event, RawEventRecord, compose_date_display, parse_raw_events, transform_records};
pub use id::derive_event_id;
pub use self::time::{Timestamp, local_now, now_utc, parse_local_date_time};
