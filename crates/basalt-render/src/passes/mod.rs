//! One module per render pass. Each pass owns its pipelines, bind group
//! layouts, uniform storage, and (where applicable) its output framebuffer;
//! the renderer wires their inputs and outputs together and fixes the frame
//! order.

pub mod blur;
pub mod bloom;
pub mod clouds;
pub mod common;
pub mod composite;
pub mod diffuse;
pub mod geometry;
pub mod lighting;
pub mod shadow;
pub mod sky;
pub mod sprite;
pub mod ssao;
pub mod water;
