//! Stage-2 ambulance routing over opened healthcenters.

pub mod packing;
