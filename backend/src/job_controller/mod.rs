//! Background work running alongside the HTTP server.
//!
//! - `scheduler`: polls for `scheduled` and `recurring` campaigns whose next
//!   execution is due and dispatches them.

pub mod scheduler;
