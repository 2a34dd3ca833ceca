//! Stowage Journal - action log, auditing and export
//!
//! Every state change the engine makes is recorded here:
//!
//! - **ActionLog**: append-only, timestamp-monotonic record of actions
//! - **LogQuery**: date range and field filters over the log
//! - **Auditor**: summaries of recorded actions
//! - **Exporter**: export entries to RON, JSON, CSV or text
//!
//! # Example
//!
//! ```rust,ignore
//! use stowage_journal::{ActionLog, ActionType, Auditor, Exporter, LogEntry, LogQuery};
//!
//! let log = ActionLog::new();
//! log.append(LogEntry::new(now, "crew-1".into(), ActionType::Placement, "001".into()));
//!
//! let entries = log.query(&LogQuery::new().by_user("crew-1"));
//! println!("{}", Auditor::new(&entries).generate_report());
//! let csv = Exporter::new(&entries).to_csv()?;
//! ```

mod action_log;
mod auditor;
mod error;
mod exporter;
mod query;

pub use action_log::{ActionLog, ActionType, LogDetails, LogEntry};
pub use auditor::{ActionSummary, AuditReport, Auditor};
pub use error::{Error, Result};
pub use exporter::{ExportFormat, Exporter};
pub use query::LogQuery;
