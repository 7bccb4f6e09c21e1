//! Parsers for system tool output
//!
//! Both parsers work on the combined stdout/stderr text captured by the
//! executor. They are strict about the summary/header lines they need and
//! lenient about everything else, since tool output varies by platform.

pub mod ping;
pub mod traceroute;

pub use ping::PingParser;
pub use traceroute::{ParsedTraceroute, Probe, RawHop, TracerouteParser};
