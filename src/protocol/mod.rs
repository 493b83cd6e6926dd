//! The submit/poll protocol core.
//!
//! ```text
//! Pdf4meClient::submit
//!   └─► transport ──► 200 ──► decode ──► DecodedResult
//!                 └─► 202 + Location ──► poll (transport × N, waiter × N-1) ──► decode
//! ```
//!
//! Modules are listed leaves first:
//! - [`transport`]: one authenticated HTTP call, statuses reported not raised
//! - [`decode`]: body + content kind → JSON object or bytes
//! - [`delay`]: the pause between polls
//! - [`poll`]: the polling state machine

pub mod decode;
pub mod delay;
pub mod poll;
pub mod transport;
