mod common;

use std::collections::BTreeSet;
use std::path::Path;

use proptest::prelude::*;

use crate::common::builders::ConfigFileBuilder;
use crate::common::executor_with;
use crate::common::fake_runner::FakeActionRunner;

use pipedag::dag::standard::{BUILD_ASSETS_TASK, BUILD_PREREQUISITES, BUILD_TASK};
use pipedag::fileset::{resolve, FileSet};
use pipedag::fs::mock::MockFileSystem;
use pipedag::transform::{concat_file_set, escape_template_literal};

// Distinct fragment contents, in a random order.
fn fragments_strategy() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z]{1,8}", 1..8)
}

proptest! {
    #[test]
    fn concat_output_follows_declared_order(contents in fragments_strategy()) {
        let fs = MockFileSystem::new();
        let names: Vec<String> = (0..contents.len()).map(|i| format!("src/f{i}.js")).collect();
        for (name, body) in names.iter().zip(&contents) {
            fs.add_file(Path::new("/p").join(name), body.as_bytes());
        }

        let set = FileSet::from_literals(Path::new("/p"), &names);
        concat_file_set(&fs, &set, b"", Path::new("/p/out/W.js")).unwrap();

        prop_assert_eq!(fs.contents("/p/out/W.js").unwrap(), contents.concat());
    }

    #[test]
    fn resolved_sets_never_contain_duplicates(
        files in proptest::collection::btree_set("[a-c]/[a-c]\\.(js|css)", 1..12),
        patterns in proptest::collection::vec(
            prop_oneof![
                Just("**/*".to_string()),
                Just("a/*".to_string()),
                Just("*/*.js".to_string()),
                Just("!b/*".to_string()),
                Just("c/a.css".to_string()),
            ],
            1..5,
        ),
    ) {
        let fs = MockFileSystem::new();
        for f in &files {
            fs.add_file(Path::new("/p").join(f), "x");
        }

        let set = resolve(&fs, Path::new("/p"), &patterns).unwrap();
        let paths: Vec<_> = set.paths().collect();
        let unique: BTreeSet<_> = paths.iter().collect();
        prop_assert_eq!(paths.len(), unique.len());

        if patterns.iter().any(|p| p == "!b/*") {
            prop_assert!(paths.iter().all(|p| !p.starts_with("/p/b")));
        }
    }

    #[test]
    fn escaped_text_has_no_unescaped_backticks(text in "[a-z`$\\\\{}]{0,24}") {
        let escaped = escape_template_literal(&text);
        let bytes = escaped.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\\' {
                i += 2;
                continue;
            }
            prop_assert_ne!(bytes[i], b'`');
            if bytes[i] == b'$' {
                prop_assert_ne!(bytes.get(i + 1).copied(), Some(b'{'));
            }
            i += 1;
        }
    }

    #[test]
    fn build_assets_run_iff_all_prerequisites_succeed(
        failing in proptest::collection::btree_set(0..BUILD_PREREQUISITES.len(), 0..=3),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let cfg = ConfigFileBuilder::new().build();

        let mut runner = FakeActionRunner::new();
        for idx in &failing {
            runner = runner.failing(BUILD_PREREQUISITES[*idx]);
        }
        let exec = executor_with(&cfg, runner.clone());

        let result = rt.block_on(exec.run(BUILD_TASK));

        prop_assert_eq!(result.is_ok(), failing.is_empty());
        prop_assert_eq!(runner.was_started(BUILD_ASSETS_TASK), failing.is_empty());
        if let (Err(err), Some(first)) = (&result, failing.iter().next()) {
            // The first failure in declared order wins.
            prop_assert_eq!(err.failed_task(), Some(BUILD_PREREQUISITES[*first]));
        }
    }
}
