//! Procedural geometry for the earthquake box
//!
//! Builders are pure functions of map space, depth range and an elevation
//! source. Each call returns freshly allocated buffers that replace the
//! previous ones wholesale.

pub mod color;
pub mod geometry;
pub mod grid;
pub mod points;
pub mod terrain;
pub mod walls;

pub use color::Color;
pub use geometry::{LineGeometry, LineTopology, MeshGeometry};
pub use grid::build_grid;
pub use points::{depth_range, InstanceBuffer, MarkerInstance};
pub use terrain::build_terrain;
pub use walls::{build_wall_edges, build_walls, Wall, WallSide};
