// Application layer - use cases and orchestration over the repository.
// The statement builder itself lives in the domain and does no I/O.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
