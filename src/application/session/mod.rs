//! Signed-in session state.

mod context;

pub use context::{SessionContext, SessionSnapshot};
