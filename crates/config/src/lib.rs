//! Configuration loading and validation.
//!
//! Configuration is read from an optional file (TOML, YAML or JSON, picked by
//! extension) and then overridden by `SIDECAR_`-prefixed environment
//! variables, with `__` separating nested keys:
//!
//! ```toml
//! database = "/var/lib/sidecar/extras.db"
//! recycle_bin = "/srv/recycle"
//! dry_run = false
//!
//! [permanently_delete]
//! subtitle = false
//! metadata = true
//! ```
//!
//! `SIDECAR_PERMANENTLY_DELETE__OTHER=true` sets `permanently_delete.other`.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use serde::{Deserialize, Serialize};
use sidecar_cache::{Database, Kind};
use sidecar_storage::disk::{LocalDisk, ReadOnlyDisk};
use sidecar_storage::{DiskHandle, RecycleBin};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const ENV_PREFIX: &str = "SIDECAR_";
const DATABASE_FILENAME: &str = "extras.db";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Location of the SQLite index.
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Where recoverable deletions are moved to. Without one, files are
    /// deleted permanently.
    #[serde(default)]
    pub recycle_bin: Option<PathBuf>,
    /// Check the disk, but never delete or move anything on it.
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub permanently_delete: PermanentlyDelete,
}

/// Per-kind overrides of the deletion policy. Unset kinds keep their default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermanentlyDelete {
    pub subtitle: Option<bool>,
    pub metadata: Option<bool>,
    pub other: Option<bool>,
}
impl PermanentlyDelete {
    pub fn for_kind(&self, kind: Kind) -> Option<bool> {
        match kind {
            Kind::Subtitle => self.subtitle,
            Kind::Metadata => self.metadata,
            Kind::Other => self.other,
        }
    }
}

fn default_database() -> PathBuf {
    match directories::ProjectDirs::from("", "", "sidecar") {
        Some(dirs) => dirs.data_dir().join(DATABASE_FILENAME),
        None => PathBuf::from(DATABASE_FILENAME),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            recycle_bin: None,
            dry_run: false,
            permanently_delete: PermanentlyDelete::default(),
        }
    }
}

impl Config {
    /// Load and validate configuration from `path` (if any) and the
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(path)?)
    }

    /// The providers [`load`](Self::load) extracts from, for callers that
    /// want to merge their own on top.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => exn::bail!(ErrorKind::Invalid(format!("unsupported config file format: {}", path.display()))),
            };
            // Figment treats a missing file as empty; an explicitly given one must exist.
            if !path.is_file() {
                exn::bail!(ErrorKind::Load);
            }
            tracing::debug!(path = %path.display(), "Loading configuration from file");
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("database path must not be empty".to_string()));
        }
        if let Some(bin) = &self.recycle_bin
            && !bin.is_absolute()
        {
            exn::bail!(ErrorKind::Invalid(format!("recycle bin must be an absolute path: {}", bin.display())));
        }
        Ok(())
    }

    /// Open (creating if needed) the index database, and its parent directory.
    pub async fn database(&self) -> Result<Database> {
        if let Some(parent) = self.database.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Database)?;
        }
        tracing::debug!(path = %self.database.display(), "Opening index database");
        Database::connect(&self.database).await.or_raise(|| ErrorKind::Database)
    }

    /// The local disk, made read-only for dry runs.
    pub fn disk(&self) -> DiskHandle {
        let disk: DiskHandle = Arc::new(LocalDisk::default());
        if self.dry_run {
            tracing::info!("Dry run: no files will be deleted or moved");
            return Arc::new(ReadOnlyDisk::new(disk));
        }
        disk
    }

    pub fn recycle_bin(&self, disk: DiskHandle) -> Result<RecycleBin> {
        RecycleBin::new(disk, self.recycle_bin.clone())
            .or_raise(|| ErrorKind::Invalid("recycle bin must be an absolute path".to_string()))
    }

    /// Whether files of `kind` are deleted permanently, given the kind's own
    /// default.
    pub fn permanently_delete(&self, kind: Kind, default: bool) -> bool {
        self.permanently_delete.for_kind(kind).unwrap_or(default)
    }
}
