//! Lexical scan of source files for quoted image path literals.
//!
//! This is a pattern match over each line, not a parse: string
//! concatenation, template interpolation and computed paths are invisible.
//! Only literals of the form `"<prefix>…"` or `'<prefix>…'` are found.

use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::layout::to_posix;

/// One occurrence of an image path literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRecord {
    pub path: String,
    pub source_file: String,
    pub line_number: usize,
}

/// An allowlisted source file and the name it is reported under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSource {
    pub path: PathBuf,
    pub label: String,
}

impl ReferenceSource {
    /// Build a source from a project-relative path. The label drops a
    /// leading `src/` so reports read `data/data.tsx:12`.
    pub fn from_relative(path: &Path) -> Self {
        let posix = to_posix(path);
        let label = posix
            .strip_prefix("src/")
            .map(str::to_string)
            .unwrap_or_else(|| posix.clone());
        Self {
            path: path.to_path_buf(),
            label,
        }
    }
}

pub fn sources_from_paths(paths: &[PathBuf]) -> Vec<ReferenceSource> {
    paths
        .iter()
        .map(|path| ReferenceSource::from_relative(path))
        .collect()
}

#[derive(Debug, Clone)]
pub struct ReferenceScanner {
    pattern: Regex,
}

impl ReferenceScanner {
    pub fn new(prefix: &str) -> Result<Self> {
        let prefix = regex::escape(prefix);
        let pattern = Regex::new(&format!(
            r#""({prefix}[^"']+)"|'({prefix}[^"']+)'"#
        ))
        .with_context(|| format!("compiling reference pattern for prefix '{prefix}'"))?;
        Ok(Self { pattern })
    }

    /// Extract every reference in `text`, attributing it to `label`.
    pub fn scan_text(&self, label: &str, text: &str) -> Vec<ReferenceRecord> {
        let mut references = Vec::new();
        for (index, line) in text.lines().enumerate() {
            for captures in self.pattern.captures_iter(line) {
                let Some(path) = captures.get(1).or_else(|| captures.get(2)) else {
                    continue;
                };
                references.push(ReferenceRecord {
                    path: path.as_str().to_string(),
                    source_file: label.to_string(),
                    line_number: index + 1,
                });
            }
        }
        references
    }

    /// Scan each allowlisted file under `project_root`, in order.
    ///
    /// Files that do not exist are skipped; read failures abort.
    pub fn scan_sources(
        &self,
        project_root: &Path,
        sources: &[ReferenceSource],
    ) -> Result<Vec<ReferenceRecord>> {
        let mut references = Vec::new();
        for source in sources {
            let path = project_root.join(&source.path);
            if !path.is_file() {
                tracing::debug!(source = %path.display(), "reference source missing; skipping");
                continue;
            }
            let bytes = fs::read(&path)
                .with_context(|| format!("reading reference source '{}'", path.display()))?;
            let text = String::from_utf8_lossy(&bytes);
            let found = self.scan_text(&source.label, &text);
            tracing::debug!(source = %source.label, count = found.len(), "scanned references");
            references.extend(found);
        }
        Ok(references)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scanner() -> ReferenceScanner {
        ReferenceScanner::new("/images/").unwrap()
    }

    #[test]
    fn test_scan_text_records_lines() {
        let text = "const a = {\n  image: '/images/a.jpg',\n  hero: getImageUrl(\"/images/hero/b.png\"), alt: \"/images/a.jpg\",\n};\n";
        let refs = scanner().scan_text("data/data.tsx", text);

        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].path, "/images/a.jpg");
        assert_eq!(refs[0].line_number, 2);
        assert_eq!(refs[1].path, "/images/hero/b.png");
        assert_eq!(refs[1].line_number, 3);
        assert_eq!(refs[2].path, "/images/a.jpg");
        assert_eq!(refs[2].line_number, 3);
        assert!(refs.iter().all(|r| r.source_file == "data/data.tsx"));
    }

    #[test]
    fn test_scan_text_requires_matching_quotes_and_prefix() {
        let text = concat!(
            "src={`/images/${name}.jpg`}\n",
            "url = \"/static/images/a.jpg\"\n",
            "broken = \"/images/a.jpg'\n",
            "empty = \"/images/\"\n",
        );
        assert!(scanner().scan_text("x", text).is_empty());
    }

    #[test]
    fn test_custom_prefix_is_escaped() {
        let scanner = ReferenceScanner::new("/img.v2/").unwrap();
        let refs = scanner.scan_text("x", "a = '/img.v2/a.png'; b = '/imgXv2/b.png'");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].path, "/img.v2/a.png");
    }

    #[test]
    fn test_scan_sources_skips_missing_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/data")).unwrap();
        fs::write(
            temp.path().join("src/data/data.tsx"),
            "export const x = '/images/a.jpg';\n",
        )
        .unwrap();

        let sources = sources_from_paths(&[
            PathBuf::from("src/data/data.tsx"),
            PathBuf::from("src/components/MePage.tsx"),
        ]);
        let refs = scanner().scan_sources(temp.path(), &sources).unwrap();

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].source_file, "data/data.tsx");
        assert_eq!(refs[0].line_number, 1);
    }

    #[test]
    fn test_scan_sources_tolerates_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/data")).unwrap();
        let mut text = b"// caf\xe9\n".to_vec();
        text.extend_from_slice(b"export const x = '/images/a.jpg';\n");
        fs::write(temp.path().join("src/data/data.tsx"), text).unwrap();

        let sources = sources_from_paths(&[PathBuf::from("src/data/data.tsx")]);
        let refs = scanner().scan_sources(temp.path(), &sources).unwrap();

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].path, "/images/a.jpg");
        assert_eq!(refs[0].line_number, 2);
    }

    #[test]
    fn test_source_labels() {
        let source = ReferenceSource::from_relative(Path::new("src/components/Sections/Hero.tsx"));
        assert_eq!(source.label, "components/Sections/Hero.tsx");
        let source = ReferenceSource::from_relative(Path::new("content/pages.md"));
        assert_eq!(source.label, "content/pages.md");
    }
}
