//! Autonomy driver: runs collectors and analyzers without prompting.
//!
//! Each iteration observes the working directory, proposes actions by
//! priority, approves or defers the top one, runs it through an
//! [`ActionRunner`] and appends the outcome to the decision history.

pub mod decide;
pub mod driver;
pub mod history;
pub mod log;
pub mod observe;
pub mod runner;
pub mod types;

pub use driver::Driver;
pub use history::{DecisionHistory, HISTORY_FILE};
pub use runner::{ActionRunner, InProcessRunner, ProcessRunner};
pub use types::*;
