//! Open OnDemand session cards for schmutz.

pub mod card;
pub mod theme;

pub use card::{CardError, INFO_HTML, SessionCard};
pub use theme::Rating;
