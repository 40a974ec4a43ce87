//! Recording system module
//!
//! - `RecordingController`: Idle -> Recording -> Reviewing lifecycle
//! - codec negotiation against the encoder backend
//! - review handles backing the finished recording with a temp file

pub mod codec;
pub mod controller;
pub mod review;
pub mod state;

pub use controller::{RecorderSettings, RecordingController};
pub use review::ReviewHandle;
pub use state::{MediaBlob, RecorderState, RecordingSession, RecordingSummary};
