//! Channel Identifier Library
//!
//! This crate provides the identifier vocabulary for radio decode channels:
//! classified, immutable facts describing what a channel currently is.
//!
//! Identifiers come in three classifications:
//!
//! - **Configuration**: static facts established when the channel is created
//!   (name, system, site, decoder type, tuned frequency)
//! - **State**: the current decode state of a channel timeslot
//! - **User**: runtime facts derived from call activity (talkgroup, radio id,
//!   call progress tones)
//!
//! An [`IdentifierCollection`] is the ordered, keyed store of a channel's
//! identifiers. Mutations produce [`IdentifierUpdateNotification`] values that
//! the owning channel routes to its subscribers; the collection itself never
//! re-broadcasts notifications it receives from elsewhere, which is what
//! keeps multi-channel identifier exchange free of feedback loops.
//!
//! # Example
//!
//! ```rust
//! use chan_identifier::{Identifier, IdentifierClass, IdentifierCollection};
//!
//! let mut collection = IdentifierCollection::new(0);
//! collection.update(Identifier::channel_name("Dispatch North"));
//! collection.update(Identifier::frequency(154_250_000));
//! collection.update(Identifier::talkgroup(4571));
//!
//! // A reset strips runtime identifiers but never configuration
//! collection.remove(IdentifierClass::User);
//! assert_eq!(collection.len(), 2);
//! ```

pub mod collection;
pub mod identifier;

pub use collection::IdentifierCollection;
pub use identifier::{
    Identifier, IdentifierClass, IdentifierForm, IdentifierOperation,
    IdentifierUpdateNotification, IdentifierValue,
};
