//! Core library for the Curve Ribbon tube-geometry engine.
//!
//! A parametric curve is sampled, a twist-free frame is carried along the
//! samples, and an equilateral cross-section is emitted at each one as line
//! geometry with a per-vertex color gradient. [`BufferSync`] keeps a
//! fixed-size render buffer in step with the live [`Parameters`], rebuilding
//! it once per frame whenever they change.

pub mod buffer;
pub mod config;
pub mod curve;
pub mod error;
pub mod frame;
pub mod frame_loop;
pub mod gradient;
pub mod mapping;
pub mod render;
pub mod ribbon;
pub mod scene;
pub mod snapshot;
pub mod sync;

pub use buffer::VertexBuffer;
pub use config::{AppConfig, Parameters};
pub use curve::{CurveFunction, PointSequence, TwistedRibbon};
pub use error::{Result, RibbonError};
pub use frame::{DegeneracyPolicy, Frame};
pub use frame_loop::{FrameLoop, FrameReport};
pub use gradient::{Color, Gradient, GradientStop};
pub use mapping::{ParameterRange, ParameterUpdate};
pub use render::{DrawStats, RenderGraph};
pub use ribbon::{CrossSection, EmissionMode};
pub use scene::{CameraPose, Projection};
pub use snapshot::Snapshot;
pub use sync::{BufferSync, ParameterStore, PassInput, RenderView, SyncState};
