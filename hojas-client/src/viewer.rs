use std::{path::PathBuf, time::Duration};

use common::error::HsResult;
use tokio::process::{Child, Command};

/// Binary document downloaded from the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Presents a downloaded document to the user. Takes ownership of the document so the buffer is
/// released as soon as the viewer is done with it.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DocumentViewer: Send + Sync {
    async fn open(&self, document: PdfDocument) -> HsResult<PathBuf>;
}

/// Grace period between the viewer program exiting and its file being removed
const RELEASE_DELAY: Duration = Duration::from_millis(100);

/// Writes documents into a directory and optionally hands them to an external program. Files
/// handed to a program are temporary and removed once the program exits. Without a program the
/// written file is the download itself and is kept.
#[derive(Debug, Clone)]
pub struct FileViewer {
    dir: PathBuf,
    program: Option<String>,
    release_delay: Duration,
}

impl FileViewer {
    pub const fn new(dir: PathBuf, program: Option<String>) -> Self {
        Self {
            dir,
            program,
            release_delay: RELEASE_DELAY,
        }
    }

    #[must_use]
    pub fn with_release_delay(mut self, release_delay: Duration) -> Self {
        self.release_delay = release_delay;
        self
    }
}

/// Wait for the viewer `child` to exit, then remove the temporary file at `path`
async fn release(mut child: Child, path: PathBuf, delay: Duration) {
    match child.wait().await {
        Ok(status) => log::debug!("Viewer for {} exited with {status}", path.display()),
        Err(error) => log::warn!("Could not wait for viewer of {}. {error}", path.display()),
    }
    tokio::time::sleep(delay).await;
    match tokio::fs::remove_file(&path).await {
        Ok(()) => log::debug!("Released {}", path.display()),
        Err(error) => log::warn!("Could not remove {}. {error}", path.display()),
    }
}

#[async_trait::async_trait]
impl DocumentViewer for FileViewer {
    async fn open(&self, document: PdfDocument) -> HsResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&document.file_name);
        tokio::fs::write(&path, document.bytes).await?;
        log::info!("Document written to {}", path.display());
        if let Some(program) = &self.program {
            let child = Command::new(program).arg(&path).spawn()?;
            log::debug!("Started {program} ({:?}) for {}", child.id(), path.display());
            tokio::spawn(release(child, path.clone(), self.release_delay));
        }
        Ok(path)
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::{DocumentViewer, FileViewer, PdfDocument};

    #[tokio::test]
    async fn file_viewer_should_write_document() -> Result<(), Box<dyn std::error::Error>> {
        let dir = std::env::temp_dir().join(format!("hojas-viewer-{}", std::process::id()));
        let viewer = FileViewer::new(dir.clone(), None);

        let path = viewer
            .open(PdfDocument {
                file_name: "nota-buena-3.pdf".to_owned(),
                bytes: b"%PDF-1.7".to_vec(),
            })
            .await?;

        assert_eq!(path, dir.join("nota-buena-3.pdf"));
        assert_eq!(tokio::fs::read(&path).await?, b"%PDF-1.7");
        tokio::fs::remove_dir_all(&dir).await?;
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_viewer_should_release_document_after_program_exits(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = std::env::temp_dir().join(format!("hojas-release-{}", std::process::id()));
        let viewer = FileViewer::new(dir.clone(), Some("true".to_owned()))
            .with_release_delay(Duration::ZERO);

        let path = viewer
            .open(PdfDocument {
                file_name: "nota-buena-8.pdf".to_owned(),
                bytes: b"%PDF-1.7".to_vec(),
            })
            .await?;

        let mut released = false;
        for _ in 0..100 {
            if tokio::fs::metadata(&path).await.is_err() {
                released = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tokio::fs::remove_dir_all(&dir).await?;
        assert!(released, "{} should have been removed", path.display());
        Ok(())
    }
}
