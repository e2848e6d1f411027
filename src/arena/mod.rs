//! Rounds played through polled mailboxes, and the registry that owns them.

mod error;
mod mailbox;
mod registry;

pub use error::ArenaError;
pub use mailbox::{Mailbox, MailboxDirectory, MailboxView, Submission};
pub use registry::{Invitation, RoundRegistry, SweepReport, coerce_kinds};
