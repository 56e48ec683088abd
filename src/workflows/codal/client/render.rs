use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::debug;

use super::transport::HttpTransport;
use crate::workflows::codal::domain::EnrichedAnnouncement;
use crate::workflows::codal::gateway::{DocumentRenderer, RenderError};

const PDFTOPPM: &str = "pdftoppm";
const DEFAULT_RESOLUTION: u32 = 150;

/// `DocumentRenderer` that downloads the PDF and shells out to poppler's
/// `pdftoppm` for page one.
#[derive(Debug, Clone)]
pub struct PopplerRenderer {
    transport: Arc<HttpTransport>,
    pdftoppm: PathBuf,
    resolution: u32,
}

impl PopplerRenderer {
    /// `poppler_path` is either the poppler `bin` directory or the
    /// `pdftoppm` executable itself; `None` looks it up on `PATH`.
    pub fn new(transport: Arc<HttpTransport>, poppler_path: Option<&Path>) -> Self {
        Self {
            transport,
            pdftoppm: resolve_pdftoppm(poppler_path),
            resolution: DEFAULT_RESOLUTION,
        }
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn tool_path(&self) -> &Path {
        &self.pdftoppm
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, RenderError> {
        self.transport.block_on(async {
            let response = self
                .transport
                .client()
                .get(url)
                .send()
                .await
                .map_err(|err| RenderError::Download(err.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(RenderError::Status {
                    status: status.as_u16(),
                });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|err| RenderError::Download(err.to_string()))?;
            Ok(bytes.to_vec())
        })
    }

    pub(crate) fn rasterize_first_page(&self, pdf: &[u8]) -> Result<Vec<u8>, RenderError> {
        let workdir = tempfile::tempdir().map_err(|err| RenderError::Rasterize(err.to_string()))?;
        let input = workdir.path().join("document.pdf");
        let output_prefix = workdir.path().join("page");
        std::fs::write(&input, pdf).map_err(|err| RenderError::Rasterize(err.to_string()))?;

        let output = Command::new(&self.pdftoppm)
            .arg("-png")
            .arg("-r")
            .arg(self.resolution.to_string())
            .args(["-f", "1", "-l", "1", "-singlefile"])
            .arg(&input)
            .arg(&output_prefix)
            .output()
            .map_err(|err| {
                RenderError::Rasterize(format!("{}: {err}", self.pdftoppm.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::Rasterize(format!(
                "{} exited with {}: {}",
                self.pdftoppm.display(),
                output.status,
                stderr.trim()
            )));
        }

        match std::fs::read(output_prefix.with_extension("png")) {
            Ok(image) if !image.is_empty() => Ok(image),
            _ => Err(RenderError::EmptyOutput),
        }
    }
}

impl DocumentRenderer for PopplerRenderer {
    fn render_first_page(&self, announcement: &EnrichedAnnouncement) -> Result<String, RenderError> {
        let url = announcement
            .summary
            .pdf_url
            .as_deref()
            .ok_or_else(|| RenderError::MissingDocument(announcement.tracing_no().to_string()))?;
        debug!(tracing_no = %announcement.tracing_no(), %url, "downloading announcement pdf");

        let pdf = self.download(url)?;
        if pdf.is_empty() {
            return Err(RenderError::Download("pdf body is empty".to_string()));
        }

        let image = self.rasterize_first_page(&pdf)?;
        Ok(STANDARD.encode(image))
    }
}

fn resolve_pdftoppm(poppler_path: Option<&Path>) -> PathBuf {
    match poppler_path {
        None => PathBuf::from(PDFTOPPM),
        Some(path) if path.as_os_str().is_empty() => PathBuf::from(PDFTOPPM),
        Some(path) if path.is_dir() => path.join(PDFTOPPM),
        Some(path) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_tool_from_directory_or_path() {
        assert_eq!(resolve_pdftoppm(None), PathBuf::from("pdftoppm"));
        assert_eq!(resolve_pdftoppm(Some(Path::new(""))), PathBuf::from("pdftoppm"));

        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(resolve_pdftoppm(Some(dir.path())), dir.path().join("pdftoppm"));

        let explicit = Path::new("/opt/poppler/bin/pdftoppm-23");
        assert_eq!(resolve_pdftoppm(Some(explicit)), explicit.to_path_buf());
    }
}
