// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::warn;

use crate::errors::{LocalFnError, Result};
use crate::instructions::{InstructionSet, WatchSpec};
use crate::types::FunctionDeclaration;

/// A function paired with its compiled include globs.
///
/// Excludes are not part of the binding; ignore patterns are applied once,
/// globally, by the watch source.
#[derive(Clone)]
pub struct WatchBinding {
    function: FunctionDeclaration,
    patterns: Vec<String>,
    include: GlobSet,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("function", &self.function.id)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    /// Compile `watch.include` for `function`.
    pub fn compile(function: FunctionDeclaration, watch: &WatchSpec) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &watch.include {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|err| LocalFnError::PatternCompileFailed {
                    function: function.id.clone(),
                    pattern: pattern.clone(),
                    reason: err.to_string(),
                })?;
            builder.add(glob);
        }
        let include = builder
            .build()
            .map_err(|err| LocalFnError::PatternCompileFailed {
                function: function.id.clone(),
                pattern: watch.include.join(", "),
                reason: err.to_string(),
            })?;

        Ok(Self {
            function,
            patterns: watch.include.clone(),
            include,
        })
    }

    pub fn function(&self) -> &FunctionDeclaration {
        &self.function
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.include.is_match(path)
    }
}

/// Compile a binding per function. A function whose patterns do not compile
/// is logged and left out; the others are unaffected.
pub fn compile_bindings(resolved: Vec<(FunctionDeclaration, InstructionSet)>) -> Vec<WatchBinding> {
    let mut bindings = Vec::with_capacity(resolved.len());
    for (function, instructions) in resolved {
        let id = function.id.clone();
        match WatchBinding::compile(function, &instructions.watch) {
            Ok(binding) => bindings.push(binding),
            Err(err) => warn!(function = %id, error = %err, "skipping function with invalid watch pattern"),
        }
    }
    bindings
}

/// Every function whose include globs match `path`, in binding order.
pub fn matching_functions(bindings: &[WatchBinding], path: &Path) -> Vec<FunctionDeclaration> {
    bindings
        .iter()
        .filter(|b| b.matches(path))
        .map(|b| b.function.clone())
        .collect()
}

/// Union of all include patterns, first occurrence order, without duplicates.
pub fn include_union(bindings: &[WatchBinding]) -> Vec<String> {
    let mut union: Vec<String> = Vec::new();
    for pattern in bindings.iter().flat_map(|b| b.patterns.iter()) {
        if !union.contains(pattern) {
            union.push(pattern.clone());
        }
    }
    union
}

/// Build a GlobSet from simple string patterns.
pub(crate) fn build_globset(patterns: &[String]) -> std::result::Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(GlobBuilder::new(pat).literal_separator(true).build()?);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::Command;
    use std::path::PathBuf;

    fn function(id: &str, src: &str) -> FunctionDeclaration {
        FunctionDeclaration {
            id: id.into(),
            root: "/proj".into(),
            runtime: "go1.x".into(),
            src_path: src.into(),
            handler: "main.go".into(),
        }
    }

    fn instructions(include: &[&str]) -> InstructionSet {
        InstructionSet {
            build: None,
            run: Command::new("true"),
            watch: WatchSpec {
                include: include.iter().map(|s| s.to_string()).collect(),
                exclude: Vec::new(),
            },
        }
    }

    #[test]
    fn path_matches_every_overlapping_function() {
        let bindings = compile_bindings(vec![
            (function("a", "/proj/a"), instructions(&["/proj/a/**/*.go"])),
            (function("all", "/proj"), instructions(&["/proj/**/*.go"])),
            (function("b", "/proj/b"), instructions(&["/proj/b/**/*.go"])),
        ]);

        let ids = |path: &str| -> Vec<String> {
            matching_functions(&bindings, Path::new(path))
                .into_iter()
                .map(|f| f.id)
                .collect()
        };

        assert_eq!(ids("/proj/a/pkg/main.go"), vec!["a", "all"]);
        assert_eq!(ids("/proj/b/main.go"), vec!["b", "all"]);
        assert!(ids("/proj/a/README.md").is_empty());
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let binding =
            WatchBinding::compile(function("a", "/proj/a"), &instructions(&["/proj/a/*.go"]).watch)
                .unwrap();
        assert!(binding.matches(Path::new("/proj/a/main.go")));
        assert!(!binding.matches(Path::new("/proj/a/pkg/main.go")));
    }

    #[test]
    fn invalid_pattern_only_drops_its_function() {
        let bindings = compile_bindings(vec![
            (function("bad", "/proj/bad"), instructions(&["/proj/bad/**/*.{go"])),
            (function("good", "/proj/good"), instructions(&["/proj/good/**/*.go"])),
        ]);

        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].function().id, "good");
        assert_eq!(
            matching_functions(&bindings, &PathBuf::from("/proj/good/x.go")).len(),
            1
        );
    }

    #[test]
    fn compile_reports_the_offending_pattern() {
        let err = WatchBinding::compile(
            function("bad", "/proj/bad"),
            &instructions(&["/proj/bad/**/*.go", "/proj/bad/[z-a].go"]).watch,
        )
        .unwrap_err();
        match err {
            LocalFnError::PatternCompileFailed { function, pattern, .. } => {
                assert_eq!(function, "bad");
                assert_eq!(pattern, "/proj/bad/[z-a].go");
            }
            other => panic!("expected PatternCompileFailed, got {other:?}"),
        }
    }

    #[test]
    fn union_is_ordered_and_deduplicated() {
        let bindings = compile_bindings(vec![
            (function("a", "/p"), instructions(&["/p/**/*.ts", "/p/**/*.js"])),
            (function("b", "/p"), instructions(&["/p/**/*.js", "/p/**/*.py"])),
        ]);
        assert_eq!(
            include_union(&bindings),
            vec!["/p/**/*.ts", "/p/**/*.js", "/p/**/*.py"]
        );
    }
}
