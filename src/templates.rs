//! Template store - named selection sets under .treemark/
//!
//! Templates persist the relative paths of a marked file set. On load every
//! stored path is re-validated against the live filesystem: entries that no
//! longer resolve to a file come back in a separate missing list instead of
//! failing the whole load.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::paths::{resolve_relative, state_dir};
use crate::error::{Error, Result};

const TEMPLATES_FILE: &str = "templates.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    /// '/'-separated paths relative to the session root, sorted.
    pub files: Vec<String>,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TemplateCatalog {
    templates: BTreeMap<String, Template>,
}

/// Summary row for `templates list`.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateInfo {
    pub name: String,
    pub file_count: usize,
    pub saved_at: DateTime<Utc>,
}

/// A template resolved against the live filesystem.
#[derive(Debug)]
pub struct LoadedTemplate {
    /// Absolute paths that still exist as files.
    pub files: Vec<PathBuf>,
    /// Stored relative paths that no longer resolve to a file.
    pub missing: Vec<String>,
}

pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn catalog_path(&self) -> PathBuf {
        state_dir(&self.root).join(TEMPLATES_FILE)
    }

    fn read_catalog(&self) -> Result<TemplateCatalog> {
        let path = self.catalog_path();
        if !path.exists() {
            return Ok(TemplateCatalog::default());
        }
        let data = fs::read_to_string(&path).map_err(|e| Error::from_io(e, &path))?;
        serde_json::from_str(&data).map_err(|e| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("corrupt template file {}: {}", path.display(), e),
            ))
        })
    }

    fn write_catalog(&self, catalog: &TemplateCatalog) -> Result<()> {
        let dir = state_dir(&self.root);
        fs::create_dir_all(&dir).map_err(|e| Error::from_io(e, &dir))?;
        let path = self.catalog_path();
        let json = serde_json::to_string_pretty(catalog).map_err(|e| {
            Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        fs::write(&path, json).map_err(|e| Error::from_io(e, &path))
    }

    /// Save (or overwrite) a named template.
    pub fn save(&self, name: &str, files: &[String]) -> Result<()> {
        let mut catalog = self.read_catalog()?;
        let mut files: Vec<String> = files.to_vec();
        files.sort();
        files.dedup();
        catalog.templates.insert(
            name.to_string(),
            Template {
                files,
                saved_at: Utc::now(),
            },
        );
        self.write_catalog(&catalog)
    }

    /// Load a template and re-validate every entry against the filesystem.
    /// Answers None for an unknown name.
    pub fn load(&self, name: &str) -> Result<Option<LoadedTemplate>> {
        let catalog = self.read_catalog()?;
        let Some(template) = catalog.templates.get(name) else {
            return Ok(None);
        };

        let mut files = Vec::new();
        let mut missing = Vec::new();
        for relative in &template.files {
            let absolute = resolve_relative(&self.root, relative);
            if absolute.is_file() {
                files.push(absolute);
            } else {
                missing.push(relative.clone());
            }
        }
        Ok(Some(LoadedTemplate { files, missing }))
    }

    pub fn list(&self) -> Result<Vec<TemplateInfo>> {
        let catalog = self.read_catalog()?;
        Ok(catalog
            .templates
            .iter()
            .map(|(name, t)| TemplateInfo {
                name: name.clone(),
                file_count: t.files.len(),
                saved_at: t.saved_at,
            })
            .collect())
    }

    /// Remove a template; answers whether it existed.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let mut catalog = self.read_catalog()?;
        let existed = catalog.templates.remove(name).is_some();
        if existed {
            self.write_catalog(&catalog)?;
        }
        Ok(existed)
    }
}
