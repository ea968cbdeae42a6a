//! Wire codec for the RFID reader protocol
//!
//! Commands go out as
//! `<frame><cmd><id>N</id><NAME>...</NAME></cmd></frame>`; replies, reports
//! and alarms come back as top level `reply`, `report` and `alarm`
//! elements. Only the small fixed vocabulary of the reader is understood;
//! this is not a general XML library.

pub mod alarm;
pub mod command;
pub mod param;
pub mod reply;
pub mod report;
pub mod pull;

pub use alarm::parse_alarms;
pub use command::{build_ack, build_command, Command};
pub use param::ParamNode;
pub use reply::{CommandReply, ReplyParameter};
pub use report::parse_reports;
