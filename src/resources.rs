use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

/// Category of externally stored asset a reference can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Texture,
    StaticMesh,
    SkeletalMesh,
    Material,
    Sound,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Texture => "Texture",
            AssetKind::StaticMesh => "StaticMesh",
            AssetKind::SkeletalMesh => "SkeletalMesh",
            AssetKind::Material => "Material",
            AssetKind::Sound => "Sound",
        }
    }
}

/// Metadata record for a loaded asset; the handle is the shared pointer.
#[derive(Debug, PartialEq, Eq)]
pub struct Asset {
    kind: AssetKind,
    path: String,
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Normalized path the asset was loaded from; also its save encoding.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// File stem, used as a display name by tooling.
    pub fn name(&self) -> &str {
        let tail = self.path.rsplit('/').next().unwrap_or(&self.path);
        tail.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(tail)
    }
}

pub type AssetHandle = Arc<Asset>;

/// Path-keyed cache of loaded assets.
///
/// Lookups are keyed by `(kind, normalized path)`. A load that cannot be
/// resolved returns `None` without signaling an error; callers treat the
/// absent handle as a null reference.
#[derive(Debug, Default)]
pub struct ResourceManager {
    root: Option<PathBuf>,
    cache: HashMap<(AssetKind, String), AssetHandle>,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager that resolves paths relative to a content root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Registers an asset without touching the filesystem.
    pub fn insert(&mut self, kind: AssetKind, path: impl AsRef<str>) -> AssetHandle {
        let normalized = normalize_path(path.as_ref());
        let handle = Arc::new(Asset {
            kind,
            path: normalized.clone(),
        });
        self.cache.insert((kind, normalized), Arc::clone(&handle));
        handle
    }

    /// Resolves a path to an asset handle, populating the cache on success.
    pub fn load(&mut self, kind: AssetKind, path: &str) -> Option<AssetHandle> {
        let normalized = normalize_path(path);
        if normalized.is_empty() {
            return None;
        }
        if let Some(handle) = self.cache.get(&(kind, normalized.clone())) {
            return Some(Arc::clone(handle));
        }
        let root = self.root.as_ref()?;
        if !root.join(&normalized).exists() {
            debug!("unresolved {} asset: {normalized}", kind.as_str());
            return None;
        }
        let handle = Arc::new(Asset {
            kind,
            path: normalized.clone(),
        });
        self.cache.insert((kind, normalized), Arc::clone(&handle));
        Some(handle)
    }

    pub fn contains(&self, kind: AssetKind, path: &str) -> bool {
        self.cache.contains_key(&(kind, normalize_path(path)))
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

fn normalize_path(path: &str) -> String {
    let mut normalized = path.trim().replace('\\', "/");
    while let Some(stripped) = normalized.strip_prefix("./") {
        normalized = stripped.to_string();
    }
    normalized
}
