//! Resolving pasted media URLs into something a browser can preview or save.
//!
//! A URL is first [classified](classify::classify) by platform, then handed to
//! the matching [`PlatformHandler`](handlers::PlatformHandler), which talks to
//! `yt-dlp` through a [`MediaExtractor`](extractor::MediaExtractor) and to
//! third-party sites through a [`WebFetcher`](web::WebFetcher).

pub mod classify;
pub mod error;
pub mod extractor;
pub mod handlers;
pub mod info;
pub mod quality;
pub mod request;
pub mod web;

pub use classify::{classify, Platform, PlatformClassification};
pub use error::MediaError;
pub use extractor::{ByteStream, MediaExtractor, StreamRequest};
pub use handlers::{MediaDownload, MediaHandlers, PlatformHandler};
pub use info::{ExtractorInfo, MediaInfo, MediaKind};
pub use quality::Quality;
pub use request::MediaRequest;
pub use web::{UpstreamBody, WebFetcher};
