use crate::editing::Document;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File is not valid UTF-8: {0}")]
    Encoding(PathBuf),
}

/// Read a text file into a document, one paragraph per line.
/// A single trailing newline is treated as the end of the last line.
pub fn read_document(path: &Path) -> Result<Document, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path)?;
    let text = String::from_utf8(bytes).map_err(|_| IoError::Encoding(path.to_path_buf()))?;
    let text = text.replace("\r\n", "\n");
    let text = text.strip_suffix('\n').unwrap_or(&text);
    Ok(Document::from_text(text))
}

/// Write a document as text, one line per paragraph
pub fn write_document(path: &Path, doc: &Document) -> Result<(), IoError> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut content = doc.to_plain_text();
    content.push('\n');
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::HostDocument;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn create_test_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_document_splits_lines_into_paragraphs() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(&dir, "ritgerð.txt", "Fyrsta lína\n\nÞriðja lína\n".as_bytes());

        let doc = read_document(&path).unwrap();

        let texts: Vec<String> = doc.paragraphs().into_iter().map(|p| p.text).collect();
        assert_eq!(texts, vec!["Fyrsta lína", "", "Þriðja lína"]);
    }

    #[test]
    fn test_read_document_normalises_crlf() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(&dir, "windows.txt", b"one\r\ntwo\r\n");

        let doc = read_document(&path).unwrap();

        assert_eq!(doc.to_plain_text(), "one\ntwo");
    }

    #[test]
    fn test_read_document_not_found() {
        let dir = TempDir::new().unwrap();
        let result = read_document(&dir.path().join("missing.txt"));
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_read_document_rejects_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(&dir, "latin1.txt", &[0x48, 0xe6, 0x0a]);

        let result = read_document(&path);

        assert!(matches!(result, Err(IoError::Encoding(_))));
    }

    #[test]
    fn test_write_document_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("folder").join("subfolder").join("out.txt");
        let doc = Document::from_text("Halló\nheimur");

        write_document(&path, &doc).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "Halló\nheimur\n");
        assert_eq!(read_document(&path).unwrap().to_plain_text(), "Halló\nheimur");
    }

    #[test]
    fn test_write_document_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(&dir, "existing.txt", b"old content\n");

        write_document(&path, &Document::from_text("new")).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
    }
}
