//! Volumetric marble material
//!
//! Per-fragment pipeline: view-ray construction, then a fixed-step march
//! through a density field read from the noise map at displaced,
//! equirectangular-projected sample points, then a two-colour resolve.
//! Every stage is a pure function of its inputs and the frame's
//! [`RenderParameters`], so fragments can be shaded in any order.

mod displace;
mod march;
mod material;
mod params;
mod projection;
mod ray;
mod resolve;

pub use march::MarchStep;
pub use material::MarbleMaterial;
pub use params::{MarbleTunables, RenderParameters};
pub use ray::FragmentContext;
pub use resolve::Rgba;
