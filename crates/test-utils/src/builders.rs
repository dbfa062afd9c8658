#![allow(dead_code)]

use pipedag::config::{ConfigFile, CopyGroupConfig, RawConfigFile, TaskConfig};
use pipedag::errors::Result;
use pipedag::types::TriggerWhileRunningBehaviour;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the same defaults as an empty `Pipedag.toml`.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn out_dir(mut self, dir: &str) -> Self {
        self.config.build.out_dir = dir.to_string();
        self
    }

    pub fn with_bundle(mut self, name: &str, sources: &[&str]) -> Self {
        self.config
            .workers
            .bundles
            .insert(name.to_string(), strings(sources));
        self
    }

    pub fn with_worker_asset(mut self, path: &str) -> Self {
        self.config.workers.assets.push(path.to_string());
        self
    }

    pub fn with_lazylib(mut self, name: &str, dir: &str) -> Self {
        self.config
            .lazylibs
            .libs
            .insert(name.to_string(), dir.to_string());
        self
    }

    pub fn with_shaders(mut self, files: &[&str]) -> Self {
        self.config.shaders.files.extend(strings(files));
        self
    }

    pub fn shader_output(mut self, path: &str) -> Self {
        self.config.shaders.output = path.to_string();
        self
    }

    pub fn with_asset_group(mut self, dest: &str, patterns: &[&str]) -> Self {
        self.config.assets.push(CopyGroupConfig {
            patterns: strings(patterns),
            dest: dest.to_string(),
        });
        self
    }

    pub fn with_example_page(mut self, cmd: &str) -> Self {
        self.config.pages.examples.push(cmd.to_string());
        self
    }

    pub fn with_icons_page(mut self, cmd: &str) -> Self {
        self.config.pages.icons.push(cmd.to_string());
        self
    }

    pub fn pack_cmd(mut self, cmd: &str) -> Self {
        self.config.pack.cmd = cmd.to_string();
        self
    }

    pub fn webserver_cmd(mut self, cmd: &str) -> Self {
        self.config.webserver.cmd = cmd.to_string();
        self
    }

    pub fn with_watch_pattern(mut self, pattern: &str) -> Self {
        self.config.watch.patterns.push(pattern.to_string());
        self
    }

    pub fn watch_tasks(mut self, tasks: &[&str]) -> Self {
        self.config.watch.tasks = strings(tasks);
        self
    }

    pub fn behaviour(mut self, behaviour: TriggerWhileRunningBehaviour) -> Self {
        self.config.watch.triggered_while_running_behaviour = behaviour;
        self
    }

    pub fn queue_length(mut self, len: usize) -> Self {
        self.config.watch.queue_length = len;
        self
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    /// Validate, returning the error instead of panicking.
    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn cmd(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: Some(cmd.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    pub fn series(children: &[&str]) -> Self {
        Self {
            task: TaskConfig {
                series: Some(strings(children)),
                ..TaskConfig::default()
            },
        }
    }

    pub fn parallel(children: &[&str]) -> Self {
        Self {
            task: TaskConfig {
                parallel: Some(strings(children)),
                ..TaskConfig::default()
            },
        }
    }

    pub fn allow_failure(mut self, val: bool) -> Self {
        self.task.allow_failure = val;
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
