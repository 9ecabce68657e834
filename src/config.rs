use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Config file looked up at the project root. Absence means defaults.
pub const CONFIG_FILENAME: &str = "image-pipeline.toml";

pub const DEFAULT_IMAGES_DIR: &str = "public/images";
pub const DEFAULT_ARCHIVE_DIR: &str = "_archive";
pub const DEFAULT_PUBLIC_PREFIX: &str = "/images/";
pub const DEFAULT_MANIFEST_FILE: &str = ".image-manifest.json";

/// Source files scanned by the validator.
pub const DEFAULT_REFERENCE_SOURCES: &[&str] = &[
    "src/data/data.tsx",
    "src/components/MePage.tsx",
    "src/components/InfoPage.tsx",
    "src/components/Sections/Hero.tsx",
];

/// Source files scanned by the archiver. Deliberately narrower than
/// [`DEFAULT_REFERENCE_SOURCES`]: an image referenced only from a component
/// file counts as an orphan for archiving.
pub const DEFAULT_ARCHIVE_SOURCES: &[&str] = &["src/data/data.tsx"];

/// Which tool a reference source list is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSurface {
    Validator,
    Archiver,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub images_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub public_prefix: String,
    pub manifest_file: String,
    pub reference_sources: Vec<PathBuf>,
    pub archive_sources: Vec<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
            archive_dir: PathBuf::from(DEFAULT_ARCHIVE_DIR),
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
            manifest_file: DEFAULT_MANIFEST_FILE.to_string(),
            reference_sources: DEFAULT_REFERENCE_SOURCES
                .iter()
                .map(PathBuf::from)
                .collect(),
            archive_sources: DEFAULT_ARCHIVE_SOURCES.iter().map(PathBuf::from).collect(),
        }
    }
}

impl PipelineConfig {
    pub fn sources_for(&self, surface: ReferenceSurface) -> &[PathBuf] {
        match surface {
            ReferenceSurface::Validator => &self.reference_sources,
            ReferenceSurface::Archiver => &self.archive_sources,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PipelineToml {
    images_dir: Option<String>,
    archive_dir: Option<String>,
    public_prefix: Option<String>,
    manifest_file: Option<String>,
    references: Option<ReferencesToml>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReferencesToml {
    sources: Option<Vec<String>>,
    archive_sources: Option<Vec<String>>,
    #[serde(default)]
    archive_uses_validator_sources: bool,
}

/// Load `image-pipeline.toml` from `project_root`, falling back to defaults
/// when the file does not exist.
pub fn load_config(project_root: &Path) -> Result<PipelineConfig> {
    let config_path = project_root.join(CONFIG_FILENAME);
    if !config_path.is_file() {
        tracing::debug!(path = %config_path.display(), "no pipeline config; using defaults");
        return Ok(PipelineConfig::default());
    }
    let raw = fs::read_to_string(&config_path)
        .with_context(|| format!("reading pipeline config '{}'", config_path.display()))?;
    parse_config(&raw, &config_path)
}

pub(crate) fn parse_config(raw: &str, config_path: &Path) -> Result<PipelineConfig> {
    let parsed: PipelineToml = toml::from_str(raw)
        .with_context(|| format!("parsing pipeline config '{}'", config_path.display()))?;
    let defaults = PipelineConfig::default();

    let images_dir = match parsed.images_dir {
        Some(dir) => parse_relative_path(&dir, "images_dir", config_path)?,
        None => defaults.images_dir,
    };
    let archive_dir = match parsed.archive_dir {
        Some(dir) => parse_relative_path(&dir, "archive_dir", config_path)?,
        None => defaults.archive_dir,
    };

    let public_prefix = parsed.public_prefix.unwrap_or(defaults.public_prefix);
    if !public_prefix.starts_with('/') || !public_prefix.ends_with('/') || public_prefix.len() < 2
    {
        bail!(
            "invalid pipeline config '{}': public_prefix '{}' must start and end with '/'",
            config_path.display(),
            public_prefix
        );
    }
    if public_prefix.contains(|c: char| c == '"' || c == '\'') {
        bail!(
            "invalid pipeline config '{}': public_prefix must not contain quote characters",
            config_path.display()
        );
    }

    let manifest_file = parsed.manifest_file.unwrap_or(defaults.manifest_file);
    if manifest_file.is_empty() || manifest_file.contains('/') {
        bail!(
            "invalid pipeline config '{}': manifest_file '{}' must be a bare file name",
            config_path.display(),
            manifest_file
        );
    }

    let references = parsed.references.unwrap_or_default();
    let reference_sources = match references.sources {
        Some(sources) => parse_source_list(&sources, "references.sources", config_path)?,
        None => defaults.reference_sources,
    };
    let archive_sources = match (
        references.archive_uses_validator_sources,
        references.archive_sources,
    ) {
        (true, Some(_)) => bail!(
            "invalid pipeline config '{}': set either references.archive_sources or \
             references.archive_uses_validator_sources, not both",
            config_path.display()
        ),
        (true, None) => reference_sources.clone(),
        (false, Some(sources)) => {
            parse_source_list(&sources, "references.archive_sources", config_path)?
        }
        (false, None) => defaults.archive_sources,
    };

    Ok(PipelineConfig {
        images_dir,
        archive_dir,
        public_prefix,
        manifest_file,
        reference_sources,
        archive_sources,
    })
}

fn parse_source_list(raw: &[String], field: &str, config_path: &Path) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::with_capacity(raw.len());
    for entry in raw {
        let path = parse_relative_path(entry, field, config_path)?;
        if !sources.contains(&path) {
            sources.push(path);
        }
    }
    Ok(sources)
}

fn parse_relative_path(raw: &str, field: &str, config_path: &Path) -> Result<PathBuf> {
    let candidate = Path::new(raw.trim());
    if candidate.as_os_str().is_empty() {
        bail!(
            "invalid pipeline config '{}': {field} must not be empty",
            config_path.display()
        );
    }
    if candidate.is_absolute() {
        bail!(
            "invalid pipeline config '{}': {field} must be relative, got absolute path '{}'",
            config_path.display(),
            raw
        );
    }
    for component in candidate.components() {
        if matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        ) {
            bail!(
                "invalid pipeline config '{}': {field} contains invalid traversal/root component in '{}'",
                config_path.display(),
                raw
            );
        }
    }
    Ok(candidate.to_path_buf())
}
