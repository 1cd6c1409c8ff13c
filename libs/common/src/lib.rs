//! Common library for the mete client
//!
//! This crate provides the primitives shared by the connection layer and the
//! command line: protocol versions, error handling, the diagnostics sink,
//! currency conversion and the fuzzy entity resolver.
//!
//! # Example
//!
//! ```rust
//! use common::{Candidate, Diagnostics, fuzzy_search};
//!
//! struct Drink(i64, &'static str);
//!
//! impl Candidate for Drink {
//!     fn candidate_id(&self) -> Option<i64> {
//!         Some(self.0)
//!     }
//!     fn candidate_name(&self) -> &str {
//!         self.1
//!     }
//! }
//!
//! let drinks = [Drink(1, "Cola"), Drink(2, "Cola Light")];
//! let diagnostics = Diagnostics::new();
//! assert_eq!(fuzzy_search(&drinks, "Cola", &diagnostics).found().map(|d| d.0), Some(1));
//! assert!(fuzzy_search(&drinks, "cola", &diagnostics).found().is_none());
//! ```

pub mod api_version;
pub mod diagnostics;
pub mod error;
pub mod money;
pub mod resolver;

pub use api_version::ApiVersion;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{MeteError, MeteResult};
pub use resolver::{Candidate, Resolution, fuzzy_search};
