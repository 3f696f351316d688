//! Client side of the dictionary: a typed HTTP client plus the state a UI
//! shell needs for the access gate, browsing, searching, adding and editing.

mod api;
pub mod recorder;
pub mod search;
pub mod session;
pub mod views;

pub use api::{ClientError, DictionaryClient, ExpressionInput, WordInput};
pub use recorder::MediaFile;
pub use session::{Session, SessionState, Theme};
