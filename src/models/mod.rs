pub mod charter_party;

pub use charter_party::{CharterParty, NewCharterParty};
