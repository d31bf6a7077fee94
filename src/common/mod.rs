pub mod id;
pub use self::id::DatabaseId;

pub mod entry;
pub use self::entry::PeerEntry;

pub mod error;
pub use self::error::Error;

pub mod metric;
pub use self::metric::{DistanceMetric, Sha256Metric, XorMetric};
