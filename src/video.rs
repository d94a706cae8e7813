//! Video catalog, decoding and the streaming frame loader.
//!
//! A [`VideoCollection`] is walked in (date, time) order by a single
//! [`StreamingLoader`] worker, which decodes every `skip_n_frames + 1`-th frame
//! into a bounded queue that the consumer drains with `read`/`more`.

mod decoder;
mod descriptor;
#[cfg(feature = "ffmpeg")]
mod ffmpeg;
mod frame;
mod loader;
mod source;

pub use decoder::{DecodeError, DecoderBackend, DefaultBackend, ImageSequenceDecoder, VideoDecoder};
pub use descriptor::{VideoCollection, VideoDescriptor};
pub use frame::Frame;
pub use loader::{LoaderConfig, LoaderError, LoaderState, StreamingLoader};
pub use source::FrameSource;

/// Identifier of a video in the project catalog.
pub type VideoId = u64;
