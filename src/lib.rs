#![forbid(unsafe_code)]

pub mod batch;
pub mod config;
pub mod curves;
pub mod field;
pub mod foundation;
pub mod overlay;
pub mod palette;
pub mod pipeline;
pub mod post;

pub use batch::{BatchOptions, BatchStats, BatchTask, CancelToken, TaskReport, run_batch};
pub use config::{ColorScheme, EffectKind, ElementDefaults, GenerationConfig, Style};
pub use curves::CurveKind;
pub use field::Pattern;
pub use foundation::core::{ImageRgb, OverlayLayer, Point, Rgb8, Rgba8};
pub use foundation::error::{FondraError, FondraResult, Stage};
pub use palette::ColorPool;
pub use pipeline::GenerationPipeline;
