//! Value records produced by the wire codec and returned by the reader API

mod alarm;
mod antenna;
mod config_id;
mod event;
mod io_port;
mod report;
mod status;
mod tag;

pub use alarm::Alarm;
pub use antenna::{Antenna, AntennaSet, ANTENNA_COUNT};
pub use config_id::ConfigId;
pub use event::ReaderEvent;
pub use io_port::{IoPort, MAX_IO_PORTS};
pub use report::{IoEvent, Report, ReportKind};
pub use status::ReaderStatus;
pub use tag::{Tag, TagField};
