//! Persisted data model for the IPA workflow
//!
//! Field names and phase strings are the on-disk compatibility surface:
//! renaming any of them breaks existing `.ipa/state.json` files.

pub mod ipa;

pub use ipa::{ArchivedCycle, Contract, Failure, Intent, IpaState, Phase};
