//! Concurrent spatial voxel-block hash table with an integrated block
//! allocator, for real-time TSDF volumetric fusion.
//!
//! Data-Oriented Programming (DOP) throughout: each subsystem splits into a
//! `*_data` module (pure structs, no methods) and a `*_operations` module
//! (free functions that read and transform that data). [`engine`] is the
//! public facade assembling them into one [`HashEngine`].

pub mod arena;
pub mod compact;
pub mod coord;
pub mod diagnostics;
pub mod engine;
pub mod entry;
pub mod error;
pub mod frustum;
pub mod integrate;
pub mod locks;
pub mod params;
pub mod scan;
pub mod sensor;
pub mod table;

pub use engine::{AllocationStats, EngineStats, GcStats, HashEngine, IntegrationStats};
pub use entry::{HashEntry, Voxel};
pub use error::{EngineError, EngineResult};
pub use params::HashParams;
pub use sensor::{CameraModel, ColorMap, DepthMap, PinholeCamera, PredicateCamera, PrefixScan, StubColorMap, StubDepthMap};
