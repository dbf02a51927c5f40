use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::InstantiateError;
use crate::loader::{ModulePath, ModuleRef};

/// One caller's intent: instantiate `source_module` as `name(args...)` into
/// `target_module`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantiationRequest {
    pub source_module: ModuleRef,
    pub name: String,
    pub args: Vec<String>,
    pub target_module: ModulePath,
    pub search_dir: PathBuf,
}

impl InstantiationRequest {
    pub fn new(
        source_module: ModuleRef,
        name: impl Into<String>,
        args: Vec<String>,
        target_module: ModulePath,
        search_dir: impl Into<PathBuf>,
    ) -> Result<Self, InstantiateError> {
        let name = name.into();
        if syn::parse_str::<syn::Ident>(&name).is_err() || name.starts_with("r#") {
            return Err(InstantiateError::InvalidName(name));
        }
        Ok(Self {
            source_module,
            name,
            args,
            target_module,
            search_dir: search_dir.into(),
        })
    }

    /// Whether generated names should be visible outside the target module.
    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }

    /// `Name(Arg1, Arg2)` as written on the command line.
    pub fn describe(&self) -> String {
        format!("{}({})", self.name, self.args.join(", "))
    }
}

/// Leading upper-case letter marks a name as exported.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

// "IntSet(i32)"
static TEMPLATE_WITH_ARGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)\((.*?)\)\s*$").expect("instantiation pattern is valid")
});

/// Parse the instantiation string `Name(A, B, C)`.
pub fn parse_template_and_args(s: &str) -> Result<(String, Vec<String>), InstantiateError> {
    let caps = TEMPLATE_WITH_ARGS
        .captures(s.trim_start())
        .ok_or_else(|| InstantiateError::BadInstantiation(s.to_string()))?;
    Ok((caps[1].to_string(), parse_args(&caps[2])))
}

/// Split an argument list on commas outside any brackets, trimming each.
///
/// An empty or all-whitespace list has no arguments.
pub fn parse_args(s: &str) -> Vec<String> {
    if s.trim().is_empty() {
        return Vec::new();
    }
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in s.chars() {
        match c {
            '<' | '(' | '[' | '{' => depth += 1,
            '>' | ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    args.push(current.trim().to_string());
    args
}
