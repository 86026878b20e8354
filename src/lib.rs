// Library surface for the binary, headless hosts and integration tests.
// The TUI lives in main.rs and never leaks into these modules.
pub mod app_dirs;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod exam;
pub mod ledger;
pub mod loader;
pub mod question;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod store;
pub mod timer;
pub mod util;

pub use exam::{ExamSession, SessionTick};
pub use ledger::Answer;
pub use question::Question;
pub use scoring::ResultRecord;
