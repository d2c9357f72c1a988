//! # Binlog Core
//!
//! The encoding and timestamp core of a high-throughput binary logger:
//!
//! * **Cheap capture**: producers append typed values to a byte stream with no
//!   formatting and no type tags, and stamp them with raw clock ticks
//! * **Exact decoding**: consumers rebuild the same values, byte for byte, or get
//!   a precise error
//! * **Timestamp reconstruction**: raw ticks become nanoseconds since the epoch
//!   and calendar time through a captured clock sync
//!
//! ## Key Features
//!
//! * Static shape classification: the Rust type decides the wire layout
//! * Compact wire format: native-endian primitives, count-prefixed variable
//!   sequences, prefix-free fixed arrays, bit-packed booleans
//! * Shape tags and dynamic visiting for consumers without the producer's types
//! * Overflow-free tick conversion for GHz-range clocks over years of uptime
//!
//! ## Main Components
//!
//! * `stream`: the `OutputStream` / `InputStream` capabilities the codec writes against
//! * `shape`: `Shape` classification and textual shape tags
//! * `serialize` / `deserialize`: the encoder and its structural mirror
//! * `visit`: shape-driven decoding into a `Value` tree
//! * `time`: `ClockSync`, tick conversions and `BrokenDownTime`
//! * `efficient_clock`: raw tick source and its calibration
//!
//! ## Quick Start
//!
//! ```
//! use binlog_core::{deserialize, serialize};
//! use binlog_core::time::{ns_since_epoch_to_broken_down_time_utc, system_clock_sync};
//!
//! // Producer: capture a sync once, then stamp and encode records
//! let sync = system_clock_sync();
//! let mut stream = Vec::<u8>::new();
//! serialize(&sync, &mut stream).unwrap();
//! serialize(&(sync.clock_value, "temperature", vec![21.5f32, 22.0]), &mut stream).unwrap();
//!
//! // Consumer: decode in the same order with the same types
//! let mut source = stream.as_slice();
//! let sync: binlog_core::time::ClockSync = deserialize(&mut source).unwrap();
//! let (ticks, name, readings): (u64, String, Vec<f32>) = deserialize(&mut source).unwrap();
//!
//! let when = ns_since_epoch_to_broken_down_time_utc(sync.to_ns_since_epoch(ticks));
//! assert_eq!(name, "temperature");
//! assert_eq!(readings, [21.5, 22.0]);
//! assert!(when.year >= 2024);
//! ```

pub mod deserialize;
pub mod efficient_clock;
pub mod error;
pub mod pal;
pub mod serialize;
pub mod shape;
pub mod stream;
pub mod time;
pub mod visit;

pub use deserialize::{deserialize, deserialize_into, from_bytes_exact, Deserialize};
pub use error::{Error, Result};
pub use serialize::{serialize, to_bytes, Serialize};
pub use shape::{Classify, Shape, SizeKind};
pub use stream::{InputStream, OutputStream};
