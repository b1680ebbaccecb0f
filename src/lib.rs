//! introreel turns a photo, a voice recording and a short script into a personal intro video.
//!
//! The pipeline is linear and deterministic:
//!
//! - Load and validate the three inputs ([`load_assets`])
//! - Decode the voice track and derive a per-frame energy envelope ([`analyze`])
//! - Lay out the background, photo, mouth and text layers on a timeline ([`build_timeline`])
//! - Composite each frame on the CPU ([`Compositor`])
//! - Stream the frames to `ffmpeg` and mux the original audio ([`encode_video`])
//!
//! [`run`] chains all of the stages.
#![forbid(unsafe_code)]

pub mod assets;
pub mod audio;
pub mod capability;
pub mod config;
pub mod encode;
pub mod foundation;
pub mod layout;
pub mod pipeline;
pub mod render;

pub use crate::assets::loader::{LoadedAssets, MediaAsset, PhotoAsset, TextAsset, load_assets};
pub use crate::audio::envelope::{AudioEnvelope, EnvelopeSample};
pub use crate::audio::{AudioAnalysis, analyze};
pub use crate::capability::{Capabilities, CommandFaceDetector, FaceBox, FaceDetector};
pub use crate::config::{BackgroundStyle, CaptionStyle, MouthShape, PipelineConfig};
pub use crate::encode::ffmpeg::{EncodeConfig, OutputVideo, encode_video};
pub use crate::foundation::core::{Canvas, Fps, FrameIndex};
pub use crate::foundation::error::{AssetKind, ReelError, ReelResult};
pub use crate::layout::timeline::{Timeline, VisualLayer, build_timeline};
pub use crate::pipeline::{PipelineInputs, render_preview, resolve_output_path, run};
pub use crate::render::composite::Compositor;
pub use crate::render::surface::FrameRGBA;
