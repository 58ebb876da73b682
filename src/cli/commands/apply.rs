//! `apply`: build manifests and apply the rendered YAML to the cluster

use std::path::{Path, PathBuf};

use tracing::instrument;

use super::run_checked;
use crate::cli::output;
use crate::config::{self, DevConfig};
use crate::errors::{AppError, AppResult};
use crate::executor::{CommandRunner, Invocation};

const MANIFEST_TARGET: &str = ":manifests";
const PREVIEW_LINES: &str = "50";

#[instrument(skip(config, runner))]
pub fn run(
    config: &DevConfig,
    runner: &dyn CommandRunner,
    start_dir: &Path,
    dry_run: bool,
) -> AppResult<()> {
    output::header(&format!(
        "Applying manifest for {} to {}",
        config.service.name, config.cluster.context
    ));

    // The service directory is wherever the config file lives; the build
    // workspace root is somewhere above it.
    let service_dir = config::find_config_file(start_dir)
        .and_then(|file| file.parent().map(Path::to_path_buf))
        .ok_or(AppError::ConfigMissing)?;
    let workspace_root = find_workspace_root(&service_dir)
        .ok_or_else(|| AppError::WorkspaceRootNotFound(service_dir.clone()))?;
    output::action("Workspace root", &workspace_root.display());

    output::step("Building manifests...");
    run_checked(
        runner,
        Invocation::new(["bazelisk", "build", MANIFEST_TARGET]).working_dir(&service_dir),
        "manifest build",
    )?;

    let manifest_file = rendered_manifest_path(config, &workspace_root, &service_dir);
    if !manifest_file.is_file() {
        return Err(AppError::ManifestNotFound(manifest_file));
    }
    output::action("Manifest file", &manifest_file.display());

    let manifest = manifest_file.display().to_string();
    if dry_run {
        output::step("Dry run - would apply manifest with:");
        output::detail(&format!(
            "kubectl apply -f {} --context {}",
            manifest, config.cluster.context
        ));
        output::step("Manifest preview:");
        let preview = run_checked(
            runner,
            Invocation::new(["head", "-n", PREVIEW_LINES, manifest.as_str()]).quiet(),
            "manifest preview",
        )?;
        output::info(&preview.stdout);
    } else {
        output::step("Applying manifest...");
        run_checked(
            runner,
            Invocation::new([
                "kubectl",
                "apply",
                "-f",
                manifest.as_str(),
                "--context",
                config.cluster.context.as_str(),
            ]),
            "kubectl apply",
        )?;
        output::success("Manifest applied");
    }
    Ok(())
}

/// Walk up from the service directory to the build workspace root.
fn find_workspace_root(service_dir: &Path) -> Option<PathBuf> {
    let mut dir = service_dir.to_path_buf();
    loop {
        if dir.join("WORKSPACE").is_file()
            || dir.join("WORKSPACE.bazel").is_file()
            || dir.join("MODULE.bazel").is_file()
            || (dir.join("BUILD.bazel").is_file() && dir.join("services").is_dir())
        {
            return Some(dir);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Rendered manifest location under bazel-bin for the target cluster.
fn rendered_manifest_path(
    config: &DevConfig,
    workspace_root: &Path,
    service_dir: &Path,
) -> PathBuf {
    let rel = service_dir
        .strip_prefix(workspace_root)
        .unwrap_or(Path::new(""));
    workspace_root
        .join("bazel-bin")
        .join(rel)
        .join(".baker")
        .join("manifests")
        .join(&config.service.name)
        .join("default")
        .join(format!("{}.yaml", config.cluster.context))
}
