// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::TriggerWhileRunningBehaviour;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [build]
/// out_dir = "build/potree"
///
/// [workers.bundles]
/// LASDecoderWorker = ["src/workers/LASDecoderWorker.js"]
///
/// [lazylibs.libs]
/// geopackage = "libs/geopackage"
///
/// [shaders]
/// files = ["src/materials/shaders/edl.vs"]
///
/// [[assets]]
/// patterns = ["resources/**/*"]
/// dest = "resources"
///
/// [watch]
/// patterns = ["src/**/*.js", "!resources/icons/index.html"]
/// ```
///
/// Every section is optional and has reasonable defaults. This is the raw,
/// unvalidated form; the rest of the crate works with [`ConfigFile`].
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub workers: WorkersSection,

    #[serde(default)]
    pub lazylibs: LazyLibsSection,

    #[serde(default)]
    pub shaders: ShadersSection,

    /// Groups copied by the final step of `build`, in order.
    #[serde(default)]
    pub assets: Vec<CopyGroupConfig>,

    #[serde(default)]
    pub pages: PagesSection,

    #[serde(default)]
    pub pack: PackSection,

    #[serde(default)]
    pub webserver: WebserverSection,

    #[serde(default)]
    pub watch: WatchSection,

    /// User-defined tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    raw: RawConfigFile,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self { raw }
    }

    pub(crate) fn raw(&self) -> &RawConfigFile {
        &self.raw
    }

    pub fn build(&self) -> &BuildSection {
        &self.raw.build
    }

    pub fn workers(&self) -> &WorkersSection {
        &self.raw.workers
    }

    pub fn lazylibs(&self) -> &LazyLibsSection {
        &self.raw.lazylibs
    }

    pub fn shaders(&self) -> &ShadersSection {
        &self.raw.shaders
    }

    pub fn assets(&self) -> &[CopyGroupConfig] {
        &self.raw.assets
    }

    pub fn pages(&self) -> &PagesSection {
        &self.raw.pages
    }

    pub fn pack(&self) -> &PackSection {
        &self.raw.pack
    }

    pub fn webserver(&self) -> &WebserverSection {
        &self.raw.webserver
    }

    pub fn watch(&self) -> &WatchSection {
        &self.raw.watch
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.raw.task
    }

    /// Output directory for everything except the shader module.
    pub fn out_dir(&self) -> PathBuf {
        PathBuf::from(&self.raw.build.out_dir)
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    #[serde(default = "default_out_dir")]
    pub out_dir: String,
}

fn default_out_dir() -> String {
    "build/potree".to_string()
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
        }
    }
}

/// `[workers]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkersSection {
    /// Subdirectory of `build.out_dir` receiving bundles and assets.
    #[serde(default = "default_workers_dir")]
    pub dir: String,

    /// Bundle name -> ordered source fragments. Output is `<dir>/<name>.js`.
    #[serde(default)]
    pub bundles: BTreeMap<String, Vec<String>>,

    /// Extra files copied next to the bundles (e.g. a `.wasm` binary).
    #[serde(default)]
    pub assets: Vec<String>,
}

fn default_workers_dir() -> String {
    "workers".to_string()
}

impl Default for WorkersSection {
    fn default() -> Self {
        Self {
            dir: default_workers_dir(),
            bundles: BTreeMap::new(),
            assets: Vec::new(),
        }
    }
}

/// `[lazylibs]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LazyLibsSection {
    #[serde(default = "default_lazylibs_dir")]
    pub dir: String,

    /// Library name -> source directory, copied to `<dir>/<name>/`.
    #[serde(default)]
    pub libs: BTreeMap<String, String>,
}

fn default_lazylibs_dir() -> String {
    "lazylibs".to_string()
}

impl Default for LazyLibsSection {
    fn default() -> Self {
        Self {
            dir: default_lazylibs_dir(),
            libs: BTreeMap::new(),
        }
    }
}

/// `[shaders]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShadersSection {
    #[serde(default)]
    pub files: Vec<String>,

    /// Path of the generated module, relative to the project root.
    #[serde(default = "default_shader_output")]
    pub output: String,
}

fn default_shader_output() -> String {
    "build/shaders/shaders.js".to_string()
}

impl Default for ShadersSection {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            output: default_shader_output(),
        }
    }
}

/// One `[[assets]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopyGroupConfig {
    pub patterns: Vec<String>,

    /// Subdirectory of `build.out_dir`; empty means the output root.
    #[serde(default)]
    pub dest: String,
}

/// `[pages]` section: page-generation commands.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PagesSection {
    /// Run concurrently by `examples_page`.
    #[serde(default)]
    pub examples: Vec<String>,

    /// Run by `icons_viewer`.
    #[serde(default)]
    pub icons: Vec<String>,
}

/// `[pack]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackSection {
    #[serde(default = "default_pack_cmd")]
    pub cmd: String,
}

fn default_pack_cmd() -> String {
    "rollup -c".to_string()
}

impl Default for PackSection {
    fn default() -> Self {
        Self {
            cmd: default_pack_cmd(),
        }
    }
}

/// `[webserver]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebserverSection {
    /// Command line; `{port}` is replaced with `port`.
    #[serde(default = "default_webserver_cmd")]
    pub cmd: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_webserver_cmd() -> String {
    "python3 -m http.server {port}".to_string()
}

fn default_port() -> u16 {
    1234
}

impl Default for WebserverSection {
    fn default() -> Self {
        Self {
            cmd: default_webserver_cmd(),
            port: default_port(),
        }
    }
}

impl WebserverSection {
    /// The command with `{port}` substituted.
    pub fn command(&self) -> String {
        self.cmd.replace("{port}", &self.port.to_string())
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Globs relative to the project root; `!` prefixes exclude.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Tasks re-run in series on every (debounced) change.
    #[serde(default = "default_watch_tasks")]
    pub tasks: Vec<String>,

    /// Quiet window used to coalesce bursts of events.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// `"queue"`, `"drop"` or `"cancel"`.
    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Maximum number of queued rebuilds to remember (queue mode).
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,
}

fn default_watch_tasks() -> Vec<String> {
    vec!["build".to_string(), "pack".to_string()]
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_queue_length() -> usize {
    1
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            tasks: default_watch_tasks(),
            debounce_ms: default_debounce_ms(),
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
            queue_length: default_queue_length(),
        }
    }
}

/// `[task.<name>]` section: a user-defined task.
///
/// Exactly one of `cmd`, `series` or `parallel` must be set.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Shell command run as a leaf action.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Child tasks run one after another.
    #[serde(default)]
    pub series: Option<Vec<String>>,

    /// Child tasks run concurrently.
    #[serde(default)]
    pub parallel: Option<Vec<String>>,

    /// For `cmd` tasks: log a non-zero exit instead of failing.
    #[serde(default)]
    pub allow_failure: bool,
}

impl TaskConfig {
    /// Names of the tasks this one composes (empty for `cmd` tasks).
    pub fn children(&self) -> &[String] {
        self.series
            .as_deref()
            .or(self.parallel.as_deref())
            .unwrap_or(&[])
    }
}
