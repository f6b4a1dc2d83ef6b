//! # Track Votes Ledger
//!
//! The vote accounting core of the track voting service.
//!
//! ## Modules
//!
//! - [`ledger`]: `VoteLedger`, pairing each user's vote set with track vote counters
//! - [`quota`]: `QuotaPolicy`, cast eligibility and the periodic quota refresh
//! - [`clock`]: time source used for refreshes and vote timestamps (`FixedClock`
//!   with the `test-util` feature)
//! - [`errors`]: the ledger error taxonomy
pub mod clock;
pub mod errors;
pub mod ledger;
pub mod quota;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-util"))]
pub use clock::FixedClock;
pub use errors::LedgerError;
pub use ledger::VoteLedger;
pub use quota::{QuotaPolicy, QuotaRefresh};
