//! HTTP Scanner - reqwest-backed probe transport
//!
//! One request per task, redirects never followed, a fixed per-request
//! budget, and every failure mapped onto the probe failure taxonomy.

pub mod error;
pub mod transport;

pub use error::classify_error;
pub use transport::HttpTransport;
