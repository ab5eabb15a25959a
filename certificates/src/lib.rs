//! # EventDesk Certificates
//!
//! Participation certificates: a name drawn onto an uploaded PNG template
//! in an uploaded font.
//!
//! - [`color`]: the colour formats organizers may type
//! - [`render`]: text layout and compositing
//! - [`upload`]: template and font validation
//! - [`store`]: the local filesystem [`AssetStore`](eventdesk_core::providers::AssetStore)
//! - [`service`]: sample rendering and batch generation over any asset store

pub mod color;
pub mod keys;
pub mod render;
pub mod request;
pub mod service;
pub mod store;
pub mod upload;

pub use color::ColorSpec;
pub use render::{CertificateRenderer, TextStyle};
pub use request::{SampleRequest, StyleRequest};
pub use service::{CertificateService, GenerationReport, RenderFailure};
pub use store::LocalAssetStore;
