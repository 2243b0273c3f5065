// Booklet sessions: one open booklet per session, driven over HTTP.
// A session owns the Document Order and re-derives layout and labels after every edit.

pub mod handlers;
pub mod session;

pub use session::{BookletSession, BookletView};
