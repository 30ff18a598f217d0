//! A synchronous, single-threaded reactive signal runtime
//!
//! *Syncpoint* models a program's changing values as a graph of *signals*.
//! A signal either is a *source*, written from the outside, or a
//! *derivation*, recomputed from other signals by a production function.
//! Every write propagates synchronously: by the time [`Signal::set`]
//! returns, every affected derivation has settled.
//!
//! Propagation is glitch-free in the diamond sense. When one source fans out
//! into several paths that join again, the join point is evaluated exactly
//! once per write, after all of its inputs have settled, and only when one
//! of its inputs actually changed value. Writes of a value equal to the
//! current one are no-ops.
//!
//! Signals may be *undefined*: a source created with [`Runtime::undefined`]
//! holds no value until the first write, and a derivation stays undefined
//! until every one of its inputs is defined.
//!
//!
//! # Example
//!
//! ```
//! # // NOTE: If you change this example, please update the README.md
//! # // accordingly, so that they remain in sync!
//! use syncpoint::Runtime;
//!
//! let rt = Runtime::new();
//!
//! // Two independent sources
//! let celsius = rt.signal(20.0);
//! let city = rt.signal("Berlin".to_string());
//!
//! // Deriving from one signal
//! let fahrenheit = celsius.map(|c| c * 9.0 / 5.0 + 32.0);
//! assert_eq!(fahrenheit.sample(), Some(68.0));
//!
//! // Deriving from several
//! let report = syncpoint::lift2(
//!     |city: String, f: f64| format!("{city}: {f} F"),
//!     &city,
//!     &fahrenheit,
//! ).unwrap();
//! assert_eq!(report.sample(), Some("Berlin: 68 F".to_string()));
//!
//! // A write updates everything downstream before returning
//! celsius.set(25.0).unwrap();
//! assert_eq!(report.sample(), Some("Berlin: 77 F".to_string()));
//! ```
//!
//! Combinators like [`Signal::filter`], [`Signal::scan`] and
//! [`Signal::chain`] build richer graphs on top of the same propagation
//! core; [`Runtime::from_listeners`] bridges external event emitters into
//! the graph.

#![warn(missing_docs)]

pub use crate::error::Error;
pub use crate::lift::{lift2, lift3};
pub use crate::listeners::{EventTarget, Listener};
pub use crate::runtime::Runtime;
pub use crate::signal::{all_defined, Signal, Unlink};
pub use crate::value::SharedFn;

mod error;
mod lift;
mod listeners;
mod runtime;
mod signal;
mod value;

#[doc(hidden)]
pub mod testing;
