//! A directory of PGN files addressed by relative paths.

use std::cmp::Ordering;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{IoError, LibraryError};
use crate::tree::Game;

/// Environment variable that overrides [`LibraryConfig::root`].
pub const LIBRARY_ENV: &str = "CHESSBOOK_LIBRARY";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub root: PathBuf,
    /// File extension of games, without the dot.
    pub extension: String,
    pub create_if_missing: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig {
            root: PathBuf::from("games"),
            extension: "pgn".to_string(),
            create_if_missing: true,
        }
    }
}

impl LibraryConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        LibraryConfig {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load a config from JSON. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| IoError::at(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Defaults, with the root taken from `CHESSBOOK_LIBRARY` when set.
    pub fn from_env() -> Self {
        match std::env::var_os(LIBRARY_ENV) {
            Some(root) if !root.is_empty() => Self::with_root(root),
            _ => Self::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Dir,
    Pgn,
}

/// One node of the library tree. Paths are relative to the library root;
/// the root entry itself has an empty path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
    pub children: Vec<LibraryEntry>,
}

impl LibraryEntry {
    fn files<'a>(&'a self, out: &mut Vec<&'a Path>) {
        match self.kind {
            EntryKind::Pgn => out.push(&self.path),
            EntryKind::Dir => {
                for child in &self.children {
                    child.files(out);
                }
            }
        }
    }
}

fn write_file(path: &Path, data: &[u8]) -> Result<(), IoError> {
    let mut file = fs::File::create(path).map_err(|e| IoError::at(path, e))?;
    file.write_all(data).map_err(|e| IoError::at(path, e))?;
    file.flush().map_err(|e| IoError::at(path, e))
}

/// Directories first, then case-insensitive by name.
fn entry_order(a: &LibraryEntry, b: &LibraryEntry) -> Ordering {
    let rank = |e: &LibraryEntry| match e.kind {
        EntryKind::Dir => 0,
        EntryKind::Pgn => 1,
    };
    rank(a)
        .cmp(&rank(b))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}

/// Single-threaded access to a game directory. The tree is rescanned after
/// every mutation made through this handle; call [`Library::refresh`] to
/// pick up changes made by others.
#[derive(Debug)]
pub struct Library {
    config: LibraryConfig,
    tree: LibraryEntry,
}

impl Library {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, LibraryError> {
        Self::with_config(LibraryConfig::with_root(root))
    }

    pub fn with_config(config: LibraryConfig) -> Result<Self, LibraryError> {
        if !config.root.is_dir() {
            if !config.create_if_missing {
                return Err(IoError::NotFound(config.root.clone()).into());
            }
            fs::create_dir_all(&config.root).map_err(|e| IoError::at(&config.root, e))?;
            info!(root = %config.root.display(), "created library directory");
        }

        let mut library = Library {
            tree: LibraryEntry {
                name: String::new(),
                path: PathBuf::new(),
                kind: EntryKind::Dir,
                children: Vec::new(),
            },
            config,
        };
        library.refresh()?;
        info!(
            root = %library.config.root.display(),
            files = library.list().len(),
            "opened library"
        );
        Ok(library)
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Rescan the directory.
    pub fn refresh(&mut self) -> Result<(), LibraryError> {
        let children = self.scan(Path::new(""))?;
        self.tree.children = children;
        debug!(files = self.list().len(), "library scanned");
        Ok(())
    }

    fn scan(&self, relative: &Path) -> Result<Vec<LibraryEntry>, LibraryError> {
        let dir = self.config.root.join(relative);
        let mut entries = Vec::new();
        for item in fs::read_dir(&dir).map_err(|e| IoError::at(&dir, e))? {
            let item = item.map_err(|e| IoError::at(&dir, e))?;
            let name = item.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let path = relative.join(&name);
            let file_type = item.file_type().map_err(|e| IoError::at(item.path(), e))?;
            if file_type.is_dir() {
                entries.push(LibraryEntry {
                    children: self.scan(&path)?,
                    name,
                    path,
                    kind: EntryKind::Dir,
                });
            } else if self.has_extension(&path) {
                entries.push(LibraryEntry {
                    name,
                    path,
                    kind: EntryKind::Pgn,
                    children: Vec::new(),
                });
            }
        }
        entries.sort_by(entry_order);
        Ok(entries)
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case(self.config.extension.as_str()))
    }

    /// The directory tree rooted at the library root.
    pub fn tree(&self) -> &LibraryEntry {
        &self.tree
    }

    /// Every game file, in tree order.
    pub fn list(&self) -> Vec<&Path> {
        let mut files = Vec::new();
        self.tree.files(&mut files);
        files
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        self.list().iter().any(|p| *p == path)
    }

    /// Check that `path` stays inside the library and return it joined to
    /// the root.
    fn resolve(&self, path: &Path) -> Result<PathBuf, LibraryError> {
        let mut clean = PathBuf::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => clean.push(part),
                Component::CurDir => {}
                _ => return Err(LibraryError::InvalidPath(path.to_path_buf())),
            }
        }
        if clean.as_os_str().is_empty() {
            return Err(LibraryError::InvalidPath(path.to_path_buf()));
        }
        Ok(self.config.root.join(clean))
    }

    fn resolve_game(&self, path: &Path) -> Result<PathBuf, LibraryError> {
        if !self.has_extension(path) {
            return Err(LibraryError::InvalidPath(path.to_path_buf()));
        }
        self.resolve(path)
    }

    /// Append the game extension unless `path` already carries it.
    fn with_extension(&self, path: &Path) -> PathBuf {
        if self.has_extension(path) {
            path.to_path_buf()
        } else {
            let mut name = path.as_os_str().to_owned();
            name.push(".");
            name.push(&self.config.extension);
            PathBuf::from(name)
        }
    }

    /// Read and parse a game. The returned game remembers `path` as its source.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Game, LibraryError> {
        let path = path.as_ref();
        let full = self.resolve_game(path)?;
        let bytes = fs::read(&full).map_err(|e| IoError::at(&full, e))?;
        let mut game = Game::from_pgn(&bytes).map_err(|source| {
            warn!(path = %path.display(), error = %source, "failed to parse library game");
            LibraryError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        game.set_source_path(path);
        debug!(path = %path.display(), nodes = game.len(), "loaded game");
        Ok(game)
    }

    /// Write `game` to `path`, creating parent directories and replacing any
    /// existing file. Returns the stored relative path.
    pub fn save(&mut self, path: impl AsRef<Path>, game: &Game) -> Result<PathBuf, LibraryError> {
        let path = self.with_extension(path.as_ref());
        let full = self.resolve(&path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| IoError::at(parent, e))?;
        }

        let data = game.to_pgn();
        let file_name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = full.with_file_name(format!(".tmp_{file_name}"));
        let written = write_file(&tmp, &data)
            .and_then(|()| fs::rename(&tmp, &full).map_err(|e| IoError::at(&full, e)));
        if let Err(err) = written {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                warn!(path = %tmp.display(), %cleanup, "temporary file left behind");
            }
            return Err(err.into());
        }

        info!(path = %path.display(), bytes = data.len(), "saved game");
        self.refresh()?;
        Ok(path)
    }

    pub fn delete_file(&mut self, path: impl AsRef<Path>) -> Result<(), LibraryError> {
        let path = path.as_ref();
        let full = self.resolve_game(path)?;
        fs::remove_file(&full).map_err(|e| IoError::at(&full, e))?;
        info!(path = %path.display(), "deleted game");
        self.refresh()
    }

    /// Remove a directory and everything in it.
    pub fn delete_dir(&mut self, path: impl AsRef<Path>) -> Result<(), LibraryError> {
        let path = path.as_ref();
        let full = self.resolve(path)?;
        fs::remove_dir_all(&full).map_err(|e| IoError::at(&full, e))?;
        info!(path = %path.display(), "deleted directory");
        self.refresh()
    }

    pub fn make_dir(&mut self, path: impl AsRef<Path>) -> Result<(), LibraryError> {
        let path = path.as_ref();
        let full = self.resolve(path)?;
        fs::create_dir_all(&full).map_err(|e| IoError::at(&full, e))?;
        info!(path = %path.display(), "created directory");
        self.refresh()
    }

    /// Move a game file or directory. A game keeps its extension.
    pub fn rename(
        &mut self,
        from: impl AsRef<Path>,
        to: impl AsRef<Path>,
    ) -> Result<PathBuf, LibraryError> {
        let from = from.as_ref();
        let source = self.resolve(from)?;
        let to = if source.is_file() {
            self.with_extension(to.as_ref())
        } else {
            to.as_ref().to_path_buf()
        };
        let target = self.resolve(&to)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| IoError::at(parent, e))?;
        }
        fs::rename(&source, &target).map_err(|e| IoError::at(&source, e))?;
        info!(from = %from.display(), to = %to.display(), "renamed");
        self.refresh()?;
        Ok(to)
    }
}
