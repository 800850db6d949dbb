use std::fmt::{Display, Formatter};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::ImageFormat;

use crate::error::{ExportError, ExportResult};
use crate::pipeline::ExportSource;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ExportFormat {
    Png,
    Svg,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            _ => Err(format!("unknown export format {s:?}")),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

/// `qr-code-<epoch-millis>.<ext>`
pub fn export_filename(format: ExportFormat, epoch_millis: i64) -> String {
    format!("qr-code-{epoch_millis}.{}", format.extension())
}

/// Serializes an export source. The PNG is the export-resolution raster, never a
/// rescaled preview.
pub fn serialize(source: &ExportSource, format: ExportFormat, epoch_millis: i64) -> ExportResult<ExportFile> {
    let bytes = match format {
        ExportFormat::Svg => source.vector.clone().into_bytes(),
        ExportFormat::Png => {
            let mut out = Cursor::new(Vec::new());
            source
                .raster
                .write_to(&mut out, ImageFormat::Png)
                .map_err(|e| ExportError::Serialize(e.to_string()))?;
            out.into_inner()
        }
    };
    Ok(ExportFile { filename: export_filename(format, epoch_millis), format, bytes })
}

// File-save capability
//------------------------------------------------------------------------------

pub trait FileSaver {
    fn save(&self, file: &ExportFile) -> ExportResult<PathBuf>;
}

impl<F: FileSaver + ?Sized> FileSaver for &F {
    fn save(&self, file: &ExportFile) -> ExportResult<PathBuf> {
        (**self).save(file)
    }
}

/// Saves exports into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirSaver {
    dir: PathBuf,
}

impl DirSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSaver for DirSaver {
    fn save(&self, file: &ExportFile) -> ExportResult<PathBuf> {
        let err = |e: std::io::Error| ExportError::Save(e.to_string());
        fs::create_dir_all(&self.dir).map_err(err)?;
        let path = self.dir.join(&file.filename);
        fs::write(&path, &file.bytes).map_err(err)?;
        Ok(path)
    }
}

// Exporter
//------------------------------------------------------------------------------

pub struct Exporter<F> {
    saver: F,
}

impl<F: FileSaver> Exporter<F> {
    pub fn new(saver: F) -> Self {
        Self { saver }
    }

    pub fn saver(&self) -> &F {
        &self.saver
    }

    pub fn export(
        &self,
        source: Option<&ExportSource>,
        format: ExportFormat,
        epoch_millis: i64,
    ) -> ExportResult<(ExportFile, PathBuf)> {
        let source = source.ok_or(ExportError::NothingToExport)?;
        let file = serialize(source, format, epoch_millis)?;
        let path = self.saver.save(&file)?;
        tracing::info!(path = %path.display(), bytes = file.bytes.len(), "Exported {format}");
        Ok((file, path))
    }
}
