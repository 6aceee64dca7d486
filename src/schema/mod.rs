//! vitals.series_request.v1 schema
//!
//! JSON request shapes accepted by the CLI and FFI entry points: intraday
//! resampling requests for any metric and multi-day heart-rate requests.

mod request;

pub use request::*;
