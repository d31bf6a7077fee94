/**
 * rust-kad
 * Kademlia bucket primitives for routing tables
 *
 * https://github.com/ryankurte/rust-kad
 * Copyright 2018 Ryan Kurte
 */

pub mod bucket;
pub use self::bucket::Bucket;
