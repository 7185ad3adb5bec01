use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

/// File name every exported story is written as
pub const EXPORT_FILE_NAME: &str = "my-story.txt";

/// Where exported stories end up
pub trait ExportSink {
    fn save(&self, file_name: &str, contents: &str) -> io::Result<PathBuf>;
}

/// Writes exports as plain files into one directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The user's documents folder, falling back to the working directory
    pub fn default_dir() -> PathBuf {
        dirs::document_dir().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Most numbered siblings tried before giving up on a free name
const MAX_EXPORT_COPIES: u32 = 999;

/// `my-story.txt`, then `my-story (1).txt`, `my-story (2).txt` ...
fn numbered_name(file_name: &str, n: u32) -> String {
    if n == 0 {
        return file_name.to_string();
    }
    let path = Path::new(file_name);
    let stem = path.file_stem().map_or(file_name.into(), |s| s.to_string_lossy());
    match path.extension() {
        Some(ext) => format!("{stem} ({n}).{}", ext.to_string_lossy()),
        None => format!("{stem} ({n})"),
    }
}

impl ExportSink for DirectorySink {
    /// Never replaces an earlier export; a taken name gets a ` (n)` suffix
    fn save(&self, file_name: &str, contents: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        for n in 0..=MAX_EXPORT_COPIES {
            let path = self.dir.join(numbered_name(file_name, n));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(contents.as_bytes())?;
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free export name for {file_name} in {}", self.dir.display()),
        ))
    }
}

/// The story compilation view: one editable buffer plus open/closed state.
/// Nothing here touches the network and nothing survives the session unless exported.
#[derive(Debug, Clone, Default)]
pub struct StoryView {
    buffer: String,
    open: bool,
}

impl StoryView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: &str) -> Self {
        Self {
            buffer: seed.to_string(),
            open: false,
        }
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Leave the view; the buffer is kept
    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn content(&self) -> &str {
        &self.buffer
    }

    /// Replace the whole buffer (direct edit)
    pub fn set_content(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    /// Add promoted text after the existing content, one blank line between
    pub fn append(&mut self, text: &str) {
        let text = text.trim_end();
        if text.trim().is_empty() {
            return;
        }
        if !self.buffer.trim().is_empty() {
            let kept = self.buffer.trim_end().len();
            self.buffer.truncate(kept);
            self.buffer.push_str("\n\n");
        } else {
            self.buffer.clear();
        }
        self.buffer.push_str(text);
    }

    pub fn can_export(&self) -> bool {
        !self.buffer.trim().is_empty()
    }

    /// Write the buffer out, then clear it and close the view.
    ///
    /// An empty buffer exports nothing and returns `Ok(None)`. On a write
    /// failure the buffer and view are left as they were.
    pub fn export(&mut self, sink: &dyn ExportSink) -> io::Result<Option<PathBuf>> {
        if !self.can_export() {
            return Ok(None);
        }

        let path = sink.save(EXPORT_FILE_NAME, &self.buffer)?;
        info!(path = %path.display(), bytes = self.buffer.len(), "story exported");

        self.buffer.clear();
        self.open = false;
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    impl ExportSink for FailingSink {
        fn save(&self, _file_name: &str, _contents: &str) -> io::Result<PathBuf> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    #[test]
    fn test_export_writes_file_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("exports"));

        let mut view = StoryView::with_seed("Once upon a time.");
        view.open();
        let path = view.export(&sink).unwrap().unwrap();

        assert_eq!(path, dir.path().join("exports").join(EXPORT_FILE_NAME));
        assert_eq!(fs::read_to_string(&path).unwrap(), "Once upon a time.");
        assert_eq!(view.content(), "");
        assert!(!view.is_open());
    }

    #[test]
    fn test_second_export_does_not_overwrite_first() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());

        let mut view = StoryView::with_seed("First draft.");
        let first = view.export(&sink).unwrap().unwrap();
        view.set_content("Second draft.");
        let second = view.export(&sink).unwrap().unwrap();

        assert_eq!(first, dir.path().join("my-story.txt"));
        assert_eq!(second, dir.path().join("my-story (1).txt"));
        assert_eq!(fs::read_to_string(&first).unwrap(), "First draft.");
        assert_eq!(fs::read_to_string(&second).unwrap(), "Second draft.");
    }

    #[test]
    fn test_numbered_names() {
        assert_eq!(numbered_name("my-story.txt", 0), "my-story.txt");
        assert_eq!(numbered_name("my-story.txt", 2), "my-story (2).txt");
        assert_eq!(numbered_name("notes", 1), "notes (1)");
    }

    #[test]
    fn test_export_is_disabled_for_blank_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());

        let mut view = StoryView::with_seed("  \n ");
        view.open();
        assert!(!view.can_export());
        assert_eq!(view.export(&sink).unwrap(), None);
        assert!(view.is_open());
        assert!(!dir.path().join(EXPORT_FILE_NAME).exists());
    }

    #[test]
    fn test_failed_export_keeps_buffer() {
        let mut view = StoryView::with_seed("keep me");
        view.open();
        assert!(view.export(&FailingSink).is_err());
        assert_eq!(view.content(), "keep me");
        assert!(view.is_open());
    }

    #[test]
    fn test_append_separates_with_blank_line() {
        let mut view = StoryView::new();
        view.append("The rain stopped.");
        view.append("  ");
        view.append("The city listened.\n");
        assert_eq!(view.content(), "The rain stopped.\n\nThe city listened.");

        view.set_content("Edited by hand.\n\n\n");
        view.append("More.");
        assert_eq!(view.content(), "Edited by hand.\n\nMore.");
    }

    #[test]
    fn test_close_keeps_buffer() {
        let mut view = StoryView::new();
        view.open();
        view.set_content("draft");
        view.close();
        assert!(!view.is_open());
        assert_eq!(view.content(), "draft");
    }
}
