//! Property tests for the pruning engine.
//!
//! Hermetic cases drive the engine over `MemoryFs`; the on-disk cases repeat
//! the load-bearing ones against a temporary directory through `DiskFs`.

use pruner::core::manifest::{
    BUILD_DESCRIPTOR, Manifest, PROOF_ONLY_DESCRIPTOR, RemovalEntry, RemovalGroup, Substitution,
    canonical_manifest,
};
use pruner::core::types::RunSummary;
use pruner::engine::Engine;
use pruner::io::fs::DiskFs;
use pruner::logging::LogConfig;
use pruner::test_support::{MemoryFs, TestTree};
use tracing::level_filters::LevelFilter;

fn quiet() -> LogConfig {
    LogConfig::new(LevelFilter::OFF)
}

fn seed_memory(fs: &MemoryFs) {
    fs.add_file("CMakeLists.txt", "OLD");
    fs.add_file("CMakeLists.proof_only.txt", "NEW");
    fs.add_file("src/main.cpp", "int main() {}");
    fs.add_file("src/capd_renderable.hpp", "#pragma once");
    fs.add_file("src/plot_common/x.txt", "plot");
    fs.add_file("src/plot_1/objects/interp.hpp", "plot");
    fs.add_dir("src/bluesky");
    fs.add_file("src/pcr3bp_basic_test/standard_system_test.cpp", "test");
    fs.add_file("src/proof/homoclinic_orbit_origins_initial_test.cpp", "test");
    fs.add_file("src/proof/g_map.hpp", "keep");
}

/// Four independent file entries followed by the build descriptor swap.
fn marker_manifest() -> Manifest {
    Manifest {
        groups: vec![
            RemovalGroup::new(
                "first batch",
                vec![RemovalEntry::file("m/one"), RemovalEntry::file("m/two")],
            ),
            RemovalGroup::new(
                "second batch",
                vec![RemovalEntry::file("m/three"), RemovalEntry::file("m/four")],
            ),
        ],
        substitutions: vec![Substitution::new(BUILD_DESCRIPTOR, PROOF_ONLY_DESCRIPTOR)],
    }
}

#[test]
fn running_twice_equals_running_once() {
    let fs = MemoryFs::new();
    seed_memory(&fs);
    let engine = Engine::new(&fs, quiet());
    let manifest = canonical_manifest();

    engine.run(&manifest).expect("first run");
    let once = fs.snapshot();
    let second = engine.run(&manifest).expect("second run");
    let twice = fs.snapshot();

    assert_eq!(once, twice);
    assert_eq!(second.removed, 0);
    assert_eq!(second.substituted, 1);
}

#[test]
fn every_manifest_path_is_absent_after_run() {
    let fs = MemoryFs::new();
    seed_memory(&fs);
    let manifest = canonical_manifest();

    Engine::new(&fs, quiet()).run(&manifest).expect("run");

    for entry in manifest.entries() {
        assert!(!fs.contains(entry.path()), "{} still present", entry.path());
    }
    assert!(fs.contains("src/proof/g_map.hpp"));
}

#[test]
fn substitution_copies_bytes_exactly() {
    let fs = MemoryFs::new();
    let payload: Vec<u8> = vec![0xff, 0x00, b'\n', 0x80, b'N', b'E', b'W'];
    fs.add_file("CMakeLists.proof_only.txt", &payload);
    fs.add_file("CMakeLists.txt", "OLD");

    Engine::new(&fs, quiet())
        .run(&canonical_manifest())
        .expect("run");

    assert_eq!(fs.read("CMakeLists.txt"), Some(payload.clone()));
    assert_eq!(fs.read("CMakeLists.proof_only.txt"), Some(payload));
}

#[test]
fn empty_tree_still_substitutes() {
    let fs = MemoryFs::new();
    fs.add_file("CMakeLists.proof_only.txt", "NEW");
    let manifest = canonical_manifest();

    let summary = Engine::new(&fs, quiet()).run(&manifest).expect("run");

    assert_eq!(
        summary,
        RunSummary {
            removed: 0,
            not_found: manifest.entries().count(),
            substituted: 1,
        }
    );
    assert_eq!(fs.read("CMakeLists.txt"), Some(b"NEW".to_vec()));
}

#[test]
fn failure_stops_at_the_failing_entry() {
    let fs = MemoryFs::new();
    for marker in ["m/one", "m/two", "m/three", "m/four"] {
        fs.add_file(marker, marker);
    }
    fs.add_file("CMakeLists.txt", "OLD");
    fs.add_file("CMakeLists.proof_only.txt", "NEW");
    fs.fail_removal_of("m/three");

    let err = Engine::new(&fs, quiet())
        .run(&marker_manifest())
        .expect_err("injected failure");

    assert!(format!("{err:#}").contains("permission denied"));
    assert!(!fs.contains("m/one"));
    assert!(!fs.contains("m/two"));
    assert!(fs.contains("m/three"));
    assert!(fs.contains("m/four"));
    assert_eq!(fs.read("CMakeLists.txt"), Some(b"OLD".to_vec()));
    assert_eq!(
        fs.operations(),
        vec!["remove_file m/one", "remove_file m/two", "remove_file m/three"]
    );
}

#[test]
fn rerun_after_failure_converges_to_clean_run() {
    let seed = |fs: &MemoryFs| {
        for marker in ["m/one", "m/two", "m/three", "m/four", "m/keep"] {
            fs.add_file(marker, marker);
        }
        fs.add_file("CMakeLists.txt", "OLD");
        fs.add_file("CMakeLists.proof_only.txt", "NEW");
    };
    let manifest = marker_manifest();

    let clean = MemoryFs::new();
    seed(&clean);
    Engine::new(&clean, quiet()).run(&manifest).expect("clean run");

    let interrupted = MemoryFs::new();
    seed(&interrupted);
    interrupted.fail_removal_of("m/two");
    let engine = Engine::new(&interrupted, quiet());
    assert!(engine.run(&manifest).is_err());
    interrupted.clear_failures();
    engine.run(&manifest).expect("resumed run");

    assert_eq!(interrupted.snapshot(), clean.snapshot());
}

#[test]
fn tree_entry_pointing_at_file_aborts() {
    let fs = MemoryFs::new();
    fs.add_file("src/plot_common", "not a directory");
    fs.add_file("CMakeLists.proof_only.txt", "NEW");

    let err = Engine::new(&fs, quiet())
        .run(&canonical_manifest())
        .expect_err("file at tree path");

    assert!(format!("{err:#}").contains("remove tree src/plot_common"));
    assert!(!fs.contains("CMakeLists.txt"));
}

#[test]
fn concrete_scenario_on_disk() {
    let tree = TestTree::new().expect("tree");
    tree.write("src/plot_common/x.txt", "x").expect("write");
    tree.write("src/main.cpp", "int main() {}").expect("write");
    tree.write("CMakeLists.txt", "OLD").expect("write");
    tree.write("CMakeLists.proof_only.txt", "NEW").expect("write");
    let manifest = Manifest {
        groups: vec![RemovalGroup::new(
            "plotting related code",
            vec![
                RemovalEntry::tree("src/plot_common"),
                RemovalEntry::file("src/main.cpp"),
            ],
        )],
        substitutions: vec![Substitution::new("CMakeLists.txt", "CMakeLists.proof_only.txt")],
    };

    Engine::new(DiskFs::new(tree.path()), quiet())
        .run(&manifest)
        .expect("run");

    assert!(!tree.exists("src/plot_common"));
    assert!(!tree.exists("src/main.cpp"));
    assert!(tree.exists("src"));
    assert_eq!(tree.read("CMakeLists.txt").expect("read"), "NEW");
}

#[test]
fn disk_run_is_idempotent() {
    let tree = TestTree::new().expect("tree");
    tree.seed_proof_repo().expect("seed");
    let engine = Engine::new(DiskFs::new(tree.path()), quiet());

    engine.run(&canonical_manifest()).expect("first run");
    let once = tree.snapshot().expect("snapshot");
    engine.run(&canonical_manifest()).expect("second run");
    let twice = tree.snapshot().expect("snapshot");

    assert_eq!(once, twice);
    assert!(once.contains_key("src/proof/g_map.hpp"));
    assert!(!once.contains_key("src/plot_1"));
}

#[test]
fn disk_failure_leaves_later_entries_untouched() {
    let tree = TestTree::new().expect("tree");
    tree.write("m/one", "1").expect("write");
    // A directory where a file removal is expected cannot be removed by it.
    tree.write("m/two/inner", "2").expect("write");
    tree.write("m/three", "3").expect("write");
    tree.write("m/four", "4").expect("write");
    tree.write("CMakeLists.txt", "OLD").expect("write");
    tree.write("CMakeLists.proof_only.txt", "NEW").expect("write");

    let err = Engine::new(DiskFs::new(tree.path()), quiet())
        .run(&marker_manifest())
        .expect_err("directory at file path");

    assert!(format!("{err:#}").contains("remove file m/two"));
    assert!(!tree.exists("m/one"));
    assert!(tree.exists("m/two/inner"));
    assert!(tree.exists("m/three"));
    assert!(tree.exists("m/four"));
    assert_eq!(tree.read("CMakeLists.txt").expect("read"), "OLD");
}

#[cfg(unix)]
#[test]
fn symlinks_are_removed_without_following() {
    let outside = TestTree::new().expect("outside");
    outside.write("data/keep.txt", "keep").expect("write");
    let tree = TestTree::new().expect("tree");
    tree.mkdir("src").expect("mkdir");
    tree.write("CMakeLists.proof_only.txt", "NEW").expect("write");
    std::os::unix::fs::symlink(outside.path().join("data"), tree.path().join("src/plot_common"))
        .expect("symlink");
    std::os::unix::fs::symlink(tree.path().join("missing.cpp"), tree.path().join("src/main.cpp"))
        .expect("dangling symlink");
    let manifest = Manifest {
        groups: vec![RemovalGroup::new(
            "plotting related code",
            vec![
                RemovalEntry::tree("src/plot_common"),
                RemovalEntry::file("src/main.cpp"),
            ],
        )],
        substitutions: Vec::new(),
    };

    let summary = Engine::new(DiskFs::new(tree.path()), quiet())
        .run(&manifest)
        .expect("run");

    assert_eq!(summary.removed, 2);
    assert!(!tree.exists("src/plot_common"));
    assert!(!tree.exists("src/main.cpp"));
    assert_eq!(outside.read("data/keep.txt").expect("read"), "keep");
}
