//! # qrkit
//!
//! A QR code studio: type text, get a live preview, restyle it, drop a logo on it and
//! export it as PNG or SVG. Every export is recorded in a small persisted history.
//!
//! Symbol encoding itself is delegated to the [`qrcode`] crate behind the
//! [`EncodingProvider`] trait; this crate owns everything around it.
//!
//! ## Features
//!
//! - **Debounced rendering**: rapid edits coalesce into a single render of the last input
//! - **Dual resolution**: cheap preview renders, a 512px export rendition alongside
//! - **Module styles**: square, rounded, extra-rounded and dots, applied on a parsed SVG tree
//! - **Logo overlays**: backing plate plus logo, composed identically on raster and vector
//! - **Export history**: bounded, deduplicated, most recent first, persisted across sessions
//!
//! ## Quick Start
//!
//! ```rust
//! use qrkit::{QrCodeProvider, RenderConfig, RenderPipeline, RenderRequest, StyleKind};
//!
//! let pipeline = RenderPipeline::new(QrCodeProvider);
//! let config = RenderConfig { style: StyleKind::Dots, ..Default::default() };
//! let outcome = pipeline.render(&RenderRequest::new("https://example.com", config), None);
//!
//! let preview = outcome.preview().expect("non-blank text renders");
//! assert_eq!(preview.raster.dimensions(), (256, 256));
//! assert!(preview.vector.contains("<circle"));
//! ```
//!
//! ### Styling existing markup
//!
//! ```rust
//! use qrkit::{apply_style, Color, StyleKind};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let markup = r##"<svg viewBox="0 0 4 4"><rect x="1" y="1" width="1" height="1" fill="#000"/></svg>"##;
//! let rounded = apply_style(markup, StyleKind::Rounded, Color::BLACK)?;
//! assert!(rounded.contains(r#"rx="0.15""#));
//! # Ok(())
//! # }
//! ```
//!
//! ### Editor with history
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use qrkit::{Controller, DirSaver, ExportFormat, FileStore, QrCodeProvider};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileStore::open(".qrkit")?;
//! let mut editor = Controller::new(QrCodeProvider, store, DirSaver::new("."));
//! editor.set_text("Hello, World!", tokio::time::Instant::now());
//! let (_file, path) = editor.export(ExportFormat::Png, Utc::now())?;
//! println!("saved {}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod color;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod export;
pub mod history;
pub mod logo;
pub mod metadata;
pub mod persist;
pub mod pipeline;
pub mod provider;
pub mod raster;
pub mod settings;
pub mod style;
pub mod svg;

pub use color::Color;
pub use controller::{Command, Controller, Edit, Snapshot};
pub use debounce::{Debouncer, DEBOUNCE_DELAY};
pub use error::*;
pub use export::{DirSaver, ExportFile, ExportFormat, Exporter, FileSaver};
pub use history::{HistoryEntry, HistoryStore, MAX_HISTORY};
pub use logo::{LogoSpec, Placement, MAX_LOGO_BYTES};
pub use metadata::{
    ECLevel, PixelSize, RenderConfig, RenderRequest, StyleKind, TextStatus, EXPORT_SIZE, MAX_CHARACTERS,
};
pub use persist::{FileStore, MemoryStore, Persistence, HISTORY_KEY, TEXT_KEY};
pub use pipeline::{ExportSource, RenderArtifact, RenderOutcome, RenderPipeline};
pub use provider::{EncodeOptions, EncodingProvider, Matrix, QrCodeProvider};
pub use settings::Settings;
pub use style::{apply_logo_raster, apply_logo_vector, apply_style};
