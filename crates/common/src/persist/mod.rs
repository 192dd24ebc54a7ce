//! The persistence coordinator
//!
//! `save`: encode -> upload -> derive keys -> read revision -> write entry
//!  (retrying on revision conflicts) -> resolvable locator.
//!
//! `load`: derive keys -> entry id -> resolvable locator -> download -> decode.

mod error;
mod persister;
mod retry;

pub use error::{Phase, PersistError, Slot};
pub use persister::{Persister, SlotState, DEFAULT_REQUEST_TIMEOUT};
pub use retry::{RetryPolicy, DEFAULT_BACKOFF, DEFAULT_MAX_ATTEMPTS};
