// src/pipeline/actions.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, info, warn};

use crate::dag::executor::{ActionRunner, BoxFuture, ChildHandles};
use crate::dag::task::{Action, CopyGroup, LazyLibrary, WorkerBundle};
use crate::errors::{PipedagError, Result};
use crate::exec::ProcessBridge;
use crate::fileset::{resolve, FileSet};
use crate::fs::FileSystem;
use crate::transform::{concat_file_set, copy_file_set, write_shader_table};

/// Performs pipeline actions relative to a project root.
#[derive(Debug, Clone)]
pub struct PipelineActions {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    bridge: ProcessBridge,
}

impl PipelineActions {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>, bridge: ProcessBridge) -> Self {
        Self {
            root: root.into(),
            fs,
            bridge,
        }
    }

    async fn perform(&self, task: &str, action: &Action) -> Result<()> {
        match action {
            Action::BuildWorkers {
                bundles,
                assets,
                out_dir,
            } => {
                let (fs, root) = (Arc::clone(&self.fs), self.root.clone());
                let (bundles, assets, out) = (bundles.clone(), assets.clone(), self.root.join(out_dir));
                blocking(task, move || build_workers(fs.as_ref(), &root, &bundles, &assets, &out)).await
            }
            Action::CopyLazyLibs { libs, out_dir } => {
                let (fs, root) = (Arc::clone(&self.fs), self.root.clone());
                let (libs, out) = (libs.clone(), self.root.join(out_dir));
                blocking(task, move || copy_lazy_libs(fs.as_ref(), &root, &libs, &out)).await
            }
            Action::WriteShaderTable { files, output } => {
                let (fs, root) = (Arc::clone(&self.fs), self.root.clone());
                let (files, target) = (files.clone(), self.root.join(output));
                blocking(task, move || {
                    let set = FileSet::from_literals(&root, &files);
                    let bytes = write_shader_table(fs.as_ref(), &set, &target)?;
                    info!(shaders = set.len(), bytes, target = %target.display(), "wrote shader table");
                    Ok(())
                })
                .await
            }
            Action::CopyAssets { groups } => {
                let (fs, root) = (Arc::clone(&self.fs), self.root.clone());
                let groups = groups.clone();
                blocking(task, move || copy_groups(fs.as_ref(), &root, &groups)).await
            }
            Action::GeneratePages { commands } => self.generate_pages(task, commands).await,
            Action::Pack { command } => {
                self.pack(command).await;
                Ok(())
            }
            Action::Serve { command } => self.bridge.ensure_server(task, command).await,
            Action::Shell {
                command,
                allow_failure,
            } => {
                let output = self.bridge.run(command).await?;
                if !output.success() && *allow_failure {
                    warn!(task = %task, exit_code = output.code.unwrap_or(-1), "command failed; allowed");
                    return Ok(());
                }
                output.into_result().map(|_| ())
            }
        }
    }

    /// Run every generator concurrently; all must succeed.
    async fn generate_pages(&self, task: &str, commands: &[String]) -> Result<()> {
        if commands.is_empty() {
            debug!(task = %task, "no page generators configured");
            return Ok(());
        }

        let mut handles = ChildHandles(
            commands
                .iter()
                .map(|command| {
                    let bridge = self.bridge.clone();
                    let owned = command.clone();
                    let handle = tokio::spawn(async move { bridge.run(&owned).await });
                    (command.clone(), handle)
                })
                .collect(),
        );

        let mut first_err = None;
        for (command, handle) in handles.0.iter_mut() {
            let result = match handle.await {
                Ok(output) => output.and_then(|o| o.into_result()),
                Err(e) => Err(PipedagError::SubprocessError {
                    command: command.clone(),
                    reason: format!("page generator did not complete: {e}"),
                }),
            };
            if let Err(err) = result {
                match first_err {
                    None => first_err = Some(err),
                    Some(_) => warn!(task = %task, error = %err, "page generator failed"),
                }
            }
        }

        first_err.map_or(Ok(()), Err)
    }

    /// The bundler's outcome is reported, never raised.
    async fn pack(&self, command: &str) {
        match self.bridge.run(command).await {
            Ok(output) if output.success() => info!(cmd = %command, "bundle complete"),
            Ok(output) => warn!(
                cmd = %command,
                exit_code = output.code.unwrap_or(-1),
                "bundler failed; continuing"
            ),
            Err(err) => warn!(cmd = %command, error = %err, "bundler could not run; continuing"),
        }
    }
}

impl ActionRunner for PipelineActions {
    fn run_action<'a>(&'a self, task: &'a str, action: &'a Action) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.perform(task, action))
    }
}

async fn blocking<F>(task: &str, work: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        PipedagError::Other(anyhow!("filesystem work for '{task}' did not complete: {e}"))
    })?
}

fn build_workers(
    fs: &dyn FileSystem,
    root: &Path,
    bundles: &[WorkerBundle],
    assets: &[String],
    out: &Path,
) -> Result<()> {
    for bundle in bundles {
        let sources = FileSet::from_literals(root, &bundle.sources);
        let target = out.join(bundle.output_file());
        let bytes = concat_file_set(fs, &sources, b"", &target)?;
        debug!(bundle = %bundle.name, fragments = sources.len(), bytes, "bundle written");
    }

    let copied = copy_file_set(fs, &FileSet::from_literals(root, assets), out)?;
    info!(bundles = bundles.len(), assets = copied, out = %out.display(), "workers built");
    Ok(())
}

fn copy_lazy_libs(fs: &dyn FileSystem, root: &Path, libs: &[LazyLibrary], out: &Path) -> Result<()> {
    for lib in libs {
        let set = resolve(fs, root, &[lib.pattern()])?;
        if set.is_empty() {
            debug!(lib = %lib.name, dir = %lib.dir, "library directory is empty or missing");
        }
        let copied = copy_file_set(fs, &set, &out.join(&lib.name))?;
        debug!(lib = %lib.name, files = copied, "library copied");
    }
    Ok(())
}

fn copy_groups(fs: &dyn FileSystem, root: &Path, groups: &[CopyGroup]) -> Result<()> {
    let mut total = 0;
    for group in groups {
        let set = resolve(fs, root, &group.patterns)?;
        total += copy_file_set(fs, &set, &root.join(&group.dest))?;
    }
    info!(groups = groups.len(), files = total, "assets copied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn actions(fs: &MockFileSystem) -> PipelineActions {
        PipelineActions::new("/p", Arc::new(fs.clone()), ProcessBridge::new("/p"))
    }

    #[tokio::test]
    async fn workers_concatenate_in_declared_order() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/a.js", "X");
        fs.add_file("/p/src/b.js", "Y");
        fs.add_file("/p/libs/laz.wasm", "bin");

        let action = Action::BuildWorkers {
            bundles: vec![WorkerBundle {
                name: "W".into(),
                sources: vec!["src/b.js".into(), "src/a.js".into()],
            }],
            assets: vec!["libs/laz.wasm".into()],
            out_dir: PathBuf::from("out/workers"),
        };
        actions(&fs).run_action("workers", &action).await.unwrap();

        assert_eq!(fs.contents("/p/out/workers/W.js").as_deref(), Some("YX"));
        assert_eq!(fs.contents("/p/out/workers/laz.wasm").as_deref(), Some("bin"));
    }

    #[tokio::test]
    async fn missing_worker_fragment_fails_without_output() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/a.js", "X");

        let action = Action::BuildWorkers {
            bundles: vec![WorkerBundle {
                name: "W".into(),
                sources: vec!["src/a.js".into(), "src/gone.js".into()],
            }],
            assets: vec![],
            out_dir: PathBuf::from("out/workers"),
        };
        let err = actions(&fs).run_action("workers", &action).await.unwrap_err();

        assert!(matches!(err, PipedagError::ReadError { .. }));
        assert!(fs.contents("/p/out/workers/W.js").is_none());
    }

    #[tokio::test]
    async fn lazy_libs_preserve_structure_and_tolerate_empty_dirs() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/libs/geo/geo.js", "g");
        fs.add_file("/p/libs/geo/sub/worker.js", "w");
        fs.add_dir("/p/libs/empty");

        let action = Action::CopyLazyLibs {
            libs: vec![
                LazyLibrary {
                    name: "geo".into(),
                    dir: "libs/geo".into(),
                },
                LazyLibrary {
                    name: "empty".into(),
                    dir: "libs/empty/".into(),
                },
            ],
            out_dir: PathBuf::from("out/lazylibs"),
        };
        actions(&fs).run_action("lazylibs", &action).await.unwrap();

        assert_eq!(
            fs.files_under("/p/out/lazylibs"),
            vec![
                PathBuf::from("/p/out/lazylibs/geo/geo.js"),
                PathBuf::from("/p/out/lazylibs/geo/sub/worker.js"),
            ]
        );
    }

    #[tokio::test]
    async fn asset_groups_land_in_their_destinations() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/resources/icons/a.svg", "<svg/>");
        fs.add_file("/p/LICENSE", "MIT");

        let action = Action::CopyAssets {
            groups: vec![
                CopyGroup {
                    patterns: vec!["resources/**/*".into()],
                    dest: PathBuf::from("out/resources"),
                },
                CopyGroup {
                    patterns: vec!["LICENSE".into()],
                    dest: PathBuf::from("out"),
                },
            ],
        };
        actions(&fs).run_action("build:assets", &action).await.unwrap();

        assert_eq!(fs.contents("/p/out/resources/icons/a.svg").as_deref(), Some("<svg/>"));
        assert_eq!(fs.contents("/p/out/LICENSE").as_deref(), Some("MIT"));
    }

    #[tokio::test]
    async fn shader_table_requires_every_file() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/shaders/a.vs", "void main(){}");

        let action = Action::WriteShaderTable {
            files: vec!["shaders/a.vs".into(), "shaders/b.fs".into()],
            output: PathBuf::from("build/shaders.js"),
        };
        let err = actions(&fs).run_action("shaders", &action).await.unwrap_err();
        assert!(matches!(err, PipedagError::ReadError { .. }));
    }

    #[tokio::test]
    async fn no_page_generators_is_success() {
        let fs = MockFileSystem::new();
        let action = Action::GeneratePages { commands: vec![] };
        actions(&fs).run_action("examples_page", &action).await.unwrap();
    }
}
