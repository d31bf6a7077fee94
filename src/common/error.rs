/**
 * rust-kad
 * Kademlia bucket error types
 *
 * https://github.com/ryankurte/rust-kad
 * Copyright 2018 Ryan Kurte
 */

#[derive(thiserror::Error, PartialEq, Clone, Debug)]
pub enum Error {
    /// Operation requires at least one entry in the bucket
    #[error("bucket is empty")]
    Empty,
    /// Identifier could not be converted into an address-space point
    #[error("invalid peer identifier: {0}")]
    InvalidId(String),
}
