use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::errors::ErrorCategory;
use crate::FILE_EXTENSION;

// ══════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid module reference {module:?}")]
    InvalidModule { module: String },

    #[error("cannot read '{}': {error}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("no source files found for module `{module}` in '{}'", dir.display())]
    NoSourceFiles { module: String, dir: PathBuf },

    #[error(
        "found {} source files for module `{module}` - can only cope with one source file for now",
        files.len()
    )]
    MultipleSourceFiles { module: String, files: Vec<PathBuf> },

    #[error("cannot determine the module of '{}': not inside a crate's src directory", dir.display())]
    NotInCrate { dir: PathBuf },
}

impl LoadError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LoadError::InvalidModule { .. } => ErrorCategory::UserInput,
            _ => ErrorCategory::Environment,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Module references
// ══════════════════════════════════════════════════════════════

/// A module path relative to the crate root; empty means the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ModulePath {
    segments: Vec<String>,
}

impl ModulePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse `a::b`, `crate::a::b` or `crate`.
    pub fn parse(s: &str) -> Result<Self, LoadError> {
        let invalid = || LoadError::InvalidModule {
            module: s.to_string(),
        };
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }
        let mut parts = trimmed.split("::").map(str::trim).peekable();
        if parts.peek() == Some(&"crate") {
            parts.next();
        }
        let mut segments = Vec::new();
        for part in parts {
            if syn::parse_str::<syn::Ident>(part).is_err() {
                return Err(invalid());
            }
            segments.push(part.to_string());
        }
        Ok(Self { segments })
    }

    pub fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The module `levels` steps up, if there is one.
    pub fn ancestor(&self, levels: usize) -> Option<ModulePath> {
        let keep = self.segments.len().checked_sub(levels)?;
        Some(Self {
            segments: self.segments[..keep].to_vec(),
        })
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "crate")
        } else {
            write!(f, "{}", self.segments.join("::"))
        }
    }
}

/// How the caller named the template module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleRef {
    /// `templates::set`, resolved under the crate's `src/`.
    Module(ModulePath),
    /// `templates/set.rs` or `templates/set`, resolved against the search dir.
    File(PathBuf),
}

impl ModuleRef {
    pub fn parse(s: &str) -> Result<Self, LoadError> {
        let looks_like_path = s.contains('/')
            || s.contains('\\')
            || s.ends_with(&format!(".{FILE_EXTENSION}"));
        if looks_like_path {
            Ok(ModuleRef::File(PathBuf::from(s)))
        } else {
            ModulePath::parse(s).map(ModuleRef::Module)
        }
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleRef::Module(path) => write!(f, "{path}"),
            ModuleRef::File(path) => write!(f, "{}", path.display()),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Resolution
// ══════════════════════════════════════════════════════════════

/// Source files that make up one module.
#[derive(Debug, Clone)]
pub struct ModuleFiles {
    /// Module path of the files, when it could be worked out.
    pub module: Option<ModulePath>,
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

impl ModuleFiles {
    /// The one file of the module.
    pub fn single(&self, name: &ModuleRef) -> Result<&Path, LoadError> {
        match self.files.as_slice() {
            [only] => Ok(only),
            [] => Err(LoadError::NoSourceFiles {
                module: name.to_string(),
                dir: self.dir.clone(),
            }),
            files => Err(LoadError::MultipleSourceFiles {
                module: name.to_string(),
                files: files.to_vec(),
            }),
        }
    }
}

/// Nearest ancestor of `start` (inclusive) holding a `Cargo.toml`.
pub fn find_crate_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join("Cargo.toml").is_file())
        .map(Path::to_path_buf)
}

/// Directory module paths are resolved under: the crate's `src/`, or
/// `search_dir` itself outside a crate.
pub fn source_root(search_dir: &Path) -> PathBuf {
    match find_crate_root(search_dir) {
        Some(root) if root.join("src").is_dir() => root.join("src"),
        _ => search_dir.to_path_buf(),
    }
}

/// Map a module path to the files that can declare it.
/// `a::b` relative to `base` → `<base>/a/b.rs`, `<base>/a/b/mod.rs`
pub fn module_file_candidates(base: &Path, module: &ModulePath) -> Vec<PathBuf> {
    if module.is_root() {
        return vec![base.join("lib.rs"), base.join("main.rs")];
    }
    let mut dir = base.to_path_buf();
    for seg in module.segments() {
        dir = dir.join(seg);
    }
    vec![dir.with_extension(FILE_EXTENSION), dir.join("mod.rs")]
}

/// Find every source file of `module`.
pub fn resolve(search_dir: &Path, module: &ModuleRef) -> Result<ModuleFiles, LoadError> {
    match module {
        ModuleRef::Module(path) => resolve_module(&source_root(search_dir), path),
        ModuleRef::File(path) => resolve_file(search_dir, path),
    }
}

fn resolve_module(base: &Path, module: &ModulePath) -> Result<ModuleFiles, LoadError> {
    let mut files: Vec<PathBuf> = module_file_candidates(base, module)
        .into_iter()
        .filter(|p| p.is_file())
        .collect();

    let mut dir = base.to_path_buf();
    for seg in module.segments() {
        dir = dir.join(seg);
    }
    // Submodule files belong to the module too; the crate root owns everything
    // so only its entry files count.
    if !module.is_root() && dir.is_dir() {
        collect_sources(&dir, &mut files)?;
    }
    files.sort();
    files.dedup();

    Ok(ModuleFiles {
        module: Some(module.clone()),
        dir,
        files,
    })
}

fn resolve_file(search_dir: &Path, path: &Path) -> Result<ModuleFiles, LoadError> {
    let full = search_dir.join(path);
    let module = module_path_of_file(&full);
    if full.is_dir() {
        let mut files = Vec::new();
        collect_sources(&full, &mut files)?;
        files.sort();
        return Ok(ModuleFiles {
            module,
            dir: full,
            files,
        });
    }
    let dir = full.parent().map_or_else(|| search_dir.to_path_buf(), Path::to_path_buf);
    let files = if full.is_file() { vec![full] } else { Vec::new() };
    Ok(ModuleFiles { module, dir, files })
}

fn collect_sources(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    let entries = fs::read_dir(dir).map_err(|error| LoadError::Io {
        path: dir.to_path_buf(),
        error,
    })?;
    for entry in entries {
        let entry = entry.map_err(|error| LoadError::Io {
            path: dir.to_path_buf(),
            error,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_sources(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == FILE_EXTENSION) {
            out.push(path);
        }
    }
    Ok(())
}

/// Module path of a source file or module directory inside a crate's `src/`.
pub fn module_path_of_file(path: &Path) -> Option<ModulePath> {
    let absolute = absolutize(path);
    let src = find_crate_root(absolute.parent()?)?.join("src");
    let rel = absolute.strip_prefix(&src).ok()?;

    let mut segments: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if let Some(last) = segments.pop() {
        match last.strip_suffix(&format!(".{FILE_EXTENSION}")) {
            Some("mod") => {}
            Some("lib" | "main") if segments.is_empty() => {}
            Some(stem) => segments.push(stem.to_string()),
            None => segments.push(last),
        }
    }
    Some(ModulePath::from_segments(segments))
}

/// Module path the files in `dir` belong to.
///
/// The crate root and its `src/` are the root module; `src/a/b` is `a::b`.
pub fn module_path_of_dir(dir: &Path) -> Result<ModulePath, LoadError> {
    let absolute = absolutize(dir);
    let not_in_crate = || LoadError::NotInCrate {
        dir: dir.to_path_buf(),
    };
    let root = find_crate_root(&absolute).ok_or_else(not_in_crate)?;
    if absolute == root {
        return Ok(ModulePath::root());
    }
    let rel = absolute
        .strip_prefix(root.join("src"))
        .map_err(|_| not_in_crate())?;
    let segments = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(ModulePath::from_segments(segments))
}

fn absolutize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
