mod collector;
mod events;
mod headers;
mod record;
mod timestamp;
mod timing;
mod trace;

pub use self::collector::TraceCollector;
pub use self::events::{Event, TraceHandle};
pub use self::headers::{canonical_name, Headers};
pub use self::timestamp::{span, Timestamp};
pub use self::timing::Timing;
pub use self::trace::Trace;
pub mod data {
    pub use crate::record::{Connection, Dns, Endpoints, Request, Session, Tls, TraceRecord, Transfer};
}
