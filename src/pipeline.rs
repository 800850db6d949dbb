use image::RgbaImage;

use crate::error::{EncodingError, EncodingResult};
use crate::logo::LogoSpec;
use crate::metadata::{ECLevel, RenderConfig, RenderRequest, StyleKind, TextStatus, EXPORT_SIZE};
use crate::provider::{EncodeOptions, EncodingProvider};
use crate::raster::rasterize;
use crate::style::{apply_logo_raster, logo_document, style_document};
use crate::svg::Document;

// Artifacts
//------------------------------------------------------------------------------

/// On-screen preview: both representations of the same request.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderArtifact {
    pub raster: RgbaImage,
    pub vector: String,
}

/// Export-resolution rendition of the same request, styled and logo-augmented.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSource {
    pub raster: RgbaImage,
    pub vector: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Rendered { preview: RenderArtifact, export: ExportSource, notice: Option<String> },
    /// Nothing to show. Carries the failure when the encoder rejected the request.
    Empty(Option<EncodingError>),
}

impl RenderOutcome {
    pub fn preview(&self) -> Option<&RenderArtifact> {
        match self {
            Self::Rendered { preview, .. } => Some(preview),
            Self::Empty(_) => None,
        }
    }

    pub fn export(&self) -> Option<&ExportSource> {
        match self {
            Self::Rendered { export, .. } => Some(export),
            Self::Empty(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }
}

// Pipeline
//------------------------------------------------------------------------------

pub struct RenderPipeline<P> {
    provider: P,
}

impl<P: EncodingProvider> RenderPipeline<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Renders `req`. Never fails: blank input and encoder failures both come back as
    /// [`RenderOutcome::Empty`], and nothing is half-populated.
    pub fn render(&self, req: &RenderRequest, logo: Option<&LogoSpec>) -> RenderOutcome {
        if req.is_blank() {
            tracing::debug!("Blank input, clearing preview");
            return RenderOutcome::Empty(None);
        }

        let notice = TextStatus::of(&req.text).notice();
        if let Some(notice) = &notice {
            tracing::info!("{notice}");
        }

        match self.try_render(req, logo) {
            Ok((preview, export)) => {
                tracing::debug!(
                    chars = req.effective_text().chars().count(),
                    size = req.config.pixel_size.px(),
                    style = %req.config.style,
                    logo = logo.is_some(),
                    "Rendered preview"
                );
                RenderOutcome::Rendered { preview, export, notice }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Render failed, clearing preview");
                RenderOutcome::Empty(Some(e))
            }
        }
    }

    fn try_render(
        &self,
        req: &RenderRequest,
        logo: Option<&LogoSpec>,
    ) -> EncodingResult<(RenderArtifact, ExportSource)> {
        let text = req.effective_text();
        let cfg = &req.config;

        let preview_opts = Self::preview_options(cfg);
        let raster = self.provider.encode(text, &preview_opts)?;
        let vector = self.provider.encode_vector(text, &preview_opts)?;

        // Logo occlusion needs the highest redundancy
        let export_opts = Self::export_options(cfg, logo.is_some());
        let export_vector = self.provider.encode_vector(text, &export_opts)?;

        let (raster, vector) = Self::compose(Some(raster), &vector, cfg, logo, preview_opts.width)?;
        let (export_raster, export_vector) = Self::compose(None, &export_vector, cfg, logo, EXPORT_SIZE)?;

        Ok((
            RenderArtifact { raster, vector },
            ExportSource { raster: export_raster, vector: export_vector },
        ))
    }

    pub fn preview_options(cfg: &RenderConfig) -> EncodeOptions {
        EncodeOptions {
            width: cfg.pixel_size.px(),
            margin: cfg.margin,
            dark: cfg.dark,
            light: cfg.light,
            ec_level: cfg.ec_level,
        }
    }

    pub fn export_options(cfg: &RenderConfig, with_logo: bool) -> EncodeOptions {
        EncodeOptions {
            width: EXPORT_SIZE,
            margin: cfg.margin.saturating_add(1),
            dark: cfg.dark,
            light: cfg.light,
            ec_level: if with_logo { ECLevel::H } else { cfg.ec_level },
        }
    }

    /// Applies style and logo to a vector rendition, and brings the raster in line with it.
    /// A square-styled `raster` from the encoder is kept; otherwise the raster is rebuilt
    /// from the styled document at `size`.
    fn compose(
        raster: Option<RgbaImage>,
        markup: &str,
        cfg: &RenderConfig,
        logo: Option<&LogoSpec>,
        size: u32,
    ) -> EncodingResult<(RgbaImage, String)> {
        let mut doc = Document::parse(markup)?;
        style_document(&mut doc, cfg.style, cfg.dark);

        let mut raster = match raster {
            Some(r) if cfg.style == StyleKind::Square => r,
            _ => rasterize(&doc, size),
        };

        if let Some(logo) = logo {
            logo_document(&mut doc, logo, cfg.light);
            apply_logo_raster(&mut raster, logo, cfg.light);
        }

        Ok((raster, doc.to_markup()?))
    }
}
