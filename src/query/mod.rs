//! Query descriptors and raw results.
//!
//! Both query mechanisms of the bucket — map/reduce views and N1QL-style
//! statements — are opaque to the mapping layer: a query is described here
//! and handed to the bucket client for execution.

mod n1ql;
mod view;

pub use n1ql::{N1qlQuery, QueryResult, QueryRow};
pub use view::{ViewQuery, ViewResult, ViewRow};
