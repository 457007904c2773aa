//! Session access to the remote scheduling service.
//!
//! The orchestration layer talks to [`AppointmentSession`] and never to HTTP
//! directly. [`HttpSession`] is the production implementation, driving the
//! service with an exported browser identity (cookies plus headers); tests
//! substitute scripted fakes behind the same trait.

pub mod error;
pub mod feed;
pub mod http_session;
pub mod session;

pub use error::{AuthError, CommitError, FetchError, NavigationError, OpenError};
pub use feed::parse_days_feed;
pub use http_session::{HttpSession, HttpSessionFactory};
pub use session::{AppointmentSession, CommitReceipt, ScheduleRef, SessionFactory};
