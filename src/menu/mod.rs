//! Support menu routing and reply texts.

mod replies;
mod router;

pub use replies::{Reply, ReplyCatalog, SupportContacts};
pub use router::{Effect, MenuOption, MenuRouter, Transition};
