// src/runtime/go.rs

//! Go family (`go*`): compiled straight to a native executable.

use crate::errors::Result;
use crate::instructions::{Command, InstructionSet, WatchSpec};
use crate::runtime::{path_arg, source_glob, HandlerPath, RuntimeContext};
use crate::types::{FunctionDeclaration, Platform};

pub fn instructions(decl: &FunctionDeclaration, ctx: &RuntimeContext) -> Result<InstructionSet> {
    let entry = HandlerPath::parse(&decl.handler);
    let mut target = ctx.artifacts.artifact_path(&decl.root, &entry.stem_path());
    if ctx.host.platform() == Platform::Windows {
        target.set_extension("exe");
    }

    let build = Command::new("go")
        .args(["build", "-o"])
        .arg(path_arg(&target))
        .arg(decl.handler.clone());

    Ok(InstructionSet {
        build: Some(build),
        run: Command::new(path_arg(&target)),
        watch: WatchSpec {
            include: vec![source_glob(&decl.src_path, "**/*.go")],
            exclude: Vec::new(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::runtime::{ArtifactDir, HostEnvironment};
    use std::sync::Arc;

    fn ctx(platform: Platform) -> RuntimeContext {
        RuntimeContext::new(
            Arc::new(MockFileSystem::new()),
            HostEnvironment::from_vars(Vec::<(String, String)>::new(), platform),
            Arc::new(ArtifactDir::new(".build/artifacts")),
            "/shims",
        )
    }

    fn decl() -> FunctionDeclaration {
        FunctionDeclaration {
            id: "worker".into(),
            root: "/proj".into(),
            runtime: "go1.x".into(),
            src_path: "/proj/services/worker".into(),
            handler: "cmd/worker/main.go".into(),
        }
    }

    #[test]
    fn builds_native_binary_and_runs_it_directly() {
        let set = instructions(&decl(), &ctx(Platform::Unix)).unwrap();

        let build = set.build.expect("go has a build step");
        assert_eq!(build.executable, "go");
        assert_eq!(
            build.args,
            vec!["build", "-o", "/proj/.build/artifacts/cmd/worker/main", "cmd/worker/main.go"]
        );
        assert_eq!(set.run.executable, "/proj/.build/artifacts/cmd/worker/main");
        assert!(set.run.args.is_empty());
        assert_eq!(set.watch.include, vec!["/proj/services/worker/**/*.go"]);
    }

    #[test]
    fn windows_binary_gets_exe_suffix() {
        let set = instructions(&decl(), &ctx(Platform::Windows)).unwrap();
        assert!(set.run.executable.ends_with("main.exe"));
    }
}
