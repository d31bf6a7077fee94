pub use crate::{Config, DuplicatePolicy};
pub use crate::table::Bucket;

pub use crate::common::{DatabaseId, DistanceMetric, PeerEntry};
pub use crate::common::{Sha256Metric, XorMetric};
pub use crate::common::{Error as BucketError};
