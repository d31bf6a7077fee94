/**
 * rust-kad
 * Distance metrics mapping peer identifiers into the address space
 *
 * https://github.com/ryankurte/rust-kad
 * Copyright 2018 Ryan Kurte
 */
use sha2::{Digest, Sha256};

use super::{DatabaseId, Error};

/// DistanceMetric converts peer identifiers into address-space points and
/// measures closeness between those points.
pub trait DistanceMetric<Id> {
    /// Point in the address space
    type Point: DatabaseId;

    /// Convert a peer identifier into an address-space point
    fn convert(&self, id: &Id) -> Result<Self::Point, Error>;

    /// Number of leading bits shared by two points
    fn common_prefix_len(&self, a: &Self::Point, b: &Self::Point) -> usize {
        DatabaseId::common_prefix_len(a, b)
    }
}

/// Metric for identifiers which are already address-space points
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct XorMetric;

impl<Id> DistanceMetric<Id> for XorMetric
where
    Id: DatabaseId,
{
    type Point = Id;

    fn convert(&self, id: &Id) -> Result<Id, Error> {
        Ok(id.clone())
    }
}

/// Metric hashing arbitrary identifier bytes into a 256-bit address space,
/// so peers are spread uniformly regardless of identifier structure.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sha256Metric;

impl Sha256Metric {
    /// Hash an identifier into its address-space point
    pub fn point(id: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(id);
        hasher.finalize().into()
    }
}

impl<Id> DistanceMetric<Id> for Sha256Metric
where
    Id: AsRef<[u8]>,
{
    type Point = [u8; 32];

    fn convert(&self, id: &Id) -> Result<[u8; 32], Error> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(Error::InvalidId("empty identifier".to_string()));
        }

        Ok(Sha256Metric::point(id))
    }
}
