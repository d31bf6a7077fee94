/**
 * rust-kad
 * Kademlia k-bucket implementation
 *
 * https://github.com/ryankurte/rust-kad
 * Copyright 2018 Ryan Kurte
 */
use strum::{Display, EnumString};

pub mod common;

pub mod table;
pub use self::table::Bucket;

pub mod prelude;

/// Handling of an insertion for a peer already present in a bucket
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Store the new entry alongside any existing ones
    Allow,
    /// Keep the existing entry and refuse the insertion
    Reject,
    /// Remove existing entries before inserting the new one
    Replace,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        DuplicatePolicy::Replace
    }
}

#[derive(PartialEq, Clone, Debug)]
#[cfg_attr(feature = "clap", derive(clap::Parser))]
pub struct Config {
    /// Expected number of entries per bucket, used to pre-allocate storage
    #[cfg_attr(feature = "clap", arg(long, default_value = "20", env = "KBUCKET_SIZE"))]
    pub bucket_size: usize,

    /// Handling of peers already present on insertion (allow, reject, replace)
    #[cfg_attr(feature = "clap", arg(long, default_value = "replace", env = "KBUCKET_DUPLICATES"))]
    pub duplicates: DuplicatePolicy,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            bucket_size: 20,
            duplicates: DuplicatePolicy::default(),
        }
    }
}
