//! Core types: time windows, events, fetch state, formatting

pub mod event;
pub mod format;
pub mod state;
pub mod time;
pub mod tracing;

pub use event::{AgendaEvent, Schedule, UNTITLED};
pub use format::{
    format_date, format_event_line, format_header_date, format_time, ALL_DAY_MARKER,
    UNSCHEDULED_MARKER,
};
pub use state::{AccessToken, FetchState, Session};
pub use time::{EventTime, TimeWindow, WindowStrategy};
pub use tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};
