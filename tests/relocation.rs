// tests/relocation.rs

mod common;
use crate::common::{clock_at, fixed_clock, init_tracing, write_file};

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};

use dirwatch::errors::DirwatchError;
use dirwatch::fs::mock::MockFileSystem;
use dirwatch::fs::{FileSystem, MoveOutcome, RealFileSystem, copy_no_clobber, copy_over};
use dirwatch::relocate::{
    Outcome, RelocationMode, RelocationOutcome, Relocator, RenamePlan, outcome_root,
};

type TestResult = Result<(), Box<dyn Error>>;

fn mock_relocator() -> (MockFileSystem, Relocator) {
    let fs = MockFileSystem::new();
    let relocator = Relocator::new(Arc::new(fs.clone()), Arc::new(fixed_clock()));
    (fs, relocator)
}

fn real_relocator() -> Relocator {
    Relocator::new(Arc::new(RealFileSystem), Arc::new(fixed_clock()))
}

#[test]
fn test_move_to_out_builds_dated_tree() -> TestResult {
    init_tracing();
    let (fs, relocator) = mock_relocator();
    fs.add_file("/data/in/report[old].[2024]..csv", b"a,b\n".to_vec());

    let outcome = relocator.move_to_out("/data/in/report[old].[2024]..csv")?;

    let expected = PathBuf::from("/data/out/2024/3/5/[14.7.3.512][report2024].csv");
    assert_eq!(outcome, RelocationOutcome::Moved { to: expected.clone() });
    assert!(fs.is_dir(Path::new("/data/out/2024/3/5")));
    assert_eq!(fs.contents(&expected), Some(b"a,b\n".to_vec()));
    assert!(!fs.exists(Path::new("/data/in/report[old].[2024]..csv")));
    Ok(())
}

#[test]
fn test_move_to_error_uses_error_tree() -> TestResult {
    let (fs, relocator) = mock_relocator();
    fs.add_file("/data/in/broken.xml", b"<x".to_vec());

    let outcome = relocator.move_to_error("/data/in/broken.xml")?;

    let expected = PathBuf::from("/data/error/2024/3/5/[14.7.3.512][broken].xml");
    assert_eq!(outcome, RelocationOutcome::Moved { to: expected.clone() });
    assert_eq!(fs.files(), vec![expected]);
    Ok(())
}

#[test]
fn test_colliding_name_leaves_second_file_in_place() -> TestResult {
    let (fs, relocator) = mock_relocator();
    fs.add_file("/data/in1/report.csv", b"first".to_vec());
    fs.add_file("/data/in2/report.csv", b"second".to_vec());

    let first = relocator.move_to_out("/data/in1/report.csv")?;
    let second = relocator.move_to_out("/data/in2/report.csv")?;

    let destination = PathBuf::from("/data/out/2024/3/5/[14.7.3.512][report].csv");
    assert_eq!(first, RelocationOutcome::Moved { to: destination.clone() });
    assert_eq!(
        second,
        RelocationOutcome::DestinationOccupied {
            source: PathBuf::from("/data/in2/report.csv"),
            destination: destination.clone(),
        }
    );

    assert_eq!(fs.contents(&destination), Some(b"first".to_vec()));
    assert_eq!(fs.contents("/data/in2/report.csv"), Some(b"second".to_vec()));
    Ok(())
}

#[test]
fn test_replace_to_error_keeps_backup_of_previous_content() -> TestResult {
    let (fs, relocator) = mock_relocator();
    fs.add_file("/data/error/2024/3/5/report.csv", b"old".to_vec());
    fs.add_file("/data/in/report.csv", b"new".to_vec());

    let outcome = relocator.replace_to_error("/data/in/report.csv")?;

    let primary = PathBuf::from("/data/error/2024/3/5/report.csv");
    let backup = PathBuf::from("/data/error/2024/3/5/backup/[14.7.3.512][report].csv");
    assert_eq!(
        outcome,
        RelocationOutcome::Replaced {
            to: primary.clone(),
            backup: backup.clone(),
        }
    );
    assert_eq!(fs.contents(&primary), Some(b"new".to_vec()));
    assert_eq!(fs.contents(&backup), Some(b"old".to_vec()));
    assert!(!fs.exists(Path::new("/data/in/report.csv")));
    Ok(())
}

#[test]
fn test_replace_to_out_backs_up_into_error_tree() -> TestResult {
    let (fs, relocator) = mock_relocator();
    fs.add_file("/data/out/2024/3/5/orders.json", b"[1]".to_vec());
    fs.add_file("/data/in/orders.json", b"[1,2]".to_vec());

    let outcome = relocator.replace_to_out("/data/in/orders.json")?;

    let backup = PathBuf::from("/data/error/2024/3/5/backup/[14.7.3.512][orders].json");
    assert_eq!(
        outcome,
        RelocationOutcome::Replaced {
            to: PathBuf::from("/data/out/2024/3/5/orders.json"),
            backup: backup.clone(),
        }
    );
    assert_eq!(fs.contents(&backup), Some(b"[1]".to_vec()));
    assert_eq!(
        fs.contents("/data/out/2024/3/5/orders.json"),
        Some(b"[1,2]".to_vec())
    );
    Ok(())
}

#[test]
fn test_replace_without_existing_destination_moves_under_original_name() -> TestResult {
    let (fs, relocator) = mock_relocator();
    fs.add_file("/data/in/orders.json", b"{}".to_vec());

    let outcome = relocator.replace_to_out("/data/in/orders.json")?;

    assert_eq!(
        outcome,
        RelocationOutcome::Moved {
            to: PathBuf::from("/data/out/2024/3/5/orders.json"),
        }
    );
    assert!(fs.is_dir(Path::new("/data/error/2024/3/5/backup")));
    assert!(!fs.exists(Path::new("/data/in/orders.json")));
    Ok(())
}

#[test]
fn test_missing_source_is_a_noop() -> TestResult {
    let (fs, relocator) = mock_relocator();
    fs.add_dir("/data/in");

    for outcome in [
        relocator.move_to_out("/data/in/gone.csv")?,
        relocator.move_to_error("/data/in/gone.csv")?,
        relocator.replace_to_out("/data/in/gone.csv")?,
        relocator.replace_to_error("/data/in/gone.csv")?,
    ] {
        assert_eq!(
            outcome,
            RelocationOutcome::SourceMissing {
                source: PathBuf::from("/data/in/gone.csv"),
            }
        );
    }

    assert!(!fs.exists(Path::new("/data/out")));
    assert!(!fs.exists(Path::new("/data/error")));
    Ok(())
}

#[test]
fn test_io_failure_propagates_and_keeps_source() {
    let (fs, relocator) = mock_relocator();
    fs.add_file("/data/in/report.csv", b"x".to_vec());
    fs.deny_writes_under("/data/out");

    let result = relocator.move_to_out("/data/in/report.csv");

    match result {
        Err(DirwatchError::Io { path, .. }) => {
            assert!(path.starts_with("/data/out"));
        }
        other => panic!("Expected Io error, got: {:?}", other),
    }
    assert!(fs.is_file(Path::new("/data/in/report.csv")));
}

#[test]
fn test_plan_does_not_touch_disk() -> TestResult {
    let (fs, relocator) = mock_relocator();
    fs.add_file("/data/in/report.csv", b"x".to_vec());

    let plan = relocator
        .plan(Path::new("/data/in/report.csv"), Outcome::Error, RelocationMode::Replace)?
        .expect("source exists");

    assert_eq!(
        plan,
        RenamePlan {
            source: PathBuf::from("/data/in/report.csv"),
            file_name: "report.csv".to_string(),
            directory: PathBuf::from("/data/error/2024/3/5"),
            destination: PathBuf::from("/data/error/2024/3/5/report.csv"),
            backup: Some(PathBuf::from(
                "/data/error/2024/3/5/backup/[14.7.3.512][report].csv"
            )),
        }
    );
    assert_eq!(fs.files(), vec![PathBuf::from("/data/in/report.csv")]);
    Ok(())
}

#[test]
fn test_outcome_root_is_parent_of_source_directory() {
    assert_eq!(outcome_root(Path::new("/data/in/x.csv")), PathBuf::from("/data"));
    assert_eq!(outcome_root(Path::new("in/x.csv")), PathBuf::from("in/.."));
    assert_eq!(outcome_root(Path::new("x.csv")), PathBuf::from("./.."));
    assert_eq!(
        outcome_root(Path::new("/data/in/../x.csv")),
        PathBuf::from("/data/in/../..")
    );
}

#[test]
fn test_real_move_to_out() -> TestResult {
    init_tracing();
    let root = tempfile::tempdir()?;
    let base = root.path().canonicalize()?;
    let source = base.join("in").join("report[old].[2024]..csv");
    write_file(&source, "a,b\n");

    let outcome = real_relocator().move_to_out(&source)?;

    let expected = base
        .join("out/2024/3/5/[14.7.3.512][report2024].csv");
    assert_eq!(outcome, RelocationOutcome::Moved { to: expected.clone() });
    assert_eq!(std::fs::read_to_string(&expected)?, "a,b\n");
    assert!(!source.exists());
    Ok(())
}

#[test]
fn test_real_replace_to_error() -> TestResult {
    let root = tempfile::tempdir()?;
    let base = root.path().canonicalize()?;
    let source = base.join("in").join("report.csv");
    let primary = base.join("error/2024/3/5/report.csv");
    write_file(&source, "new");
    write_file(&primary, "old");

    let outcome = real_relocator().replace_to_error(&source)?;

    let backup = base
        .join("error/2024/3/5/backup/[14.7.3.512][report].csv");
    assert_eq!(
        outcome,
        RelocationOutcome::Replaced {
            to: primary.clone(),
            backup: backup.clone(),
        }
    );
    assert_eq!(std::fs::read_to_string(&primary)?, "new");
    assert_eq!(std::fs::read_to_string(&backup)?, "old");
    assert!(!source.exists());
    Ok(())
}

#[test]
fn test_real_concurrent_moves_to_same_name_have_one_winner() -> TestResult {
    let root = tempfile::tempdir()?;
    let base = root.path().canonicalize()?;
    let first = base.join("in1").join("report.csv");
    let second = base.join("in2").join("report.csv");
    write_file(&first, "first");
    write_file(&second, "second");

    let relocator = real_relocator();
    let outcomes = std::thread::scope(|s| {
        let a = s.spawn(|| relocator.move_to_out(&first));
        let b = s.spawn(|| relocator.move_to_out(&second));
        [a.join().unwrap(), b.join().unwrap()]
    });

    let outcomes = outcomes.into_iter().collect::<Result<Vec<_>, _>>()?;
    let moved = outcomes
        .iter()
        .filter(|o| matches!(o, RelocationOutcome::Moved { .. }))
        .count();
    let occupied = outcomes
        .iter()
        .filter(|o| matches!(o, RelocationOutcome::DestinationOccupied { .. }))
        .count();
    assert_eq!((moved, occupied), (1, 1));

    // Exactly one source is left, untouched.
    let left: Vec<_> = [&first, &second].into_iter().filter(|p| p.exists()).collect();
    assert_eq!(left.len(), 1);
    let winner_content = std::fs::read_to_string(
        base.join("out/2024/3/5/[14.7.3.512][report].csv"),
    )?;
    let loser_content = std::fs::read_to_string(left[0])?;
    assert_ne!(winner_content, loser_content);
    Ok(())
}

#[tokio::test]
async fn test_async_wrappers_match_sync_behaviour() -> TestResult {
    let root = tempfile::tempdir()?;
    let base = root.path().canonicalize()?;
    let relocator = real_relocator();

    let failed = base.join("in").join("bad.txt");
    write_file(&failed, "bad");
    let outcome = relocator.move_to_error_async(failed.clone()).await?;
    assert_eq!(
        outcome,
        RelocationOutcome::Moved {
            to: base.join("error/2024/3/5/[14.7.3.512][bad].txt"),
        }
    );

    let done = base.join("in").join("good.txt");
    write_file(&done, "good");
    let outcome = relocator.replace_to_out_async(done.clone()).await?;
    assert_eq!(
        outcome,
        RelocationOutcome::Moved {
            to: base.join("out/2024/3/5/good.txt"),
        }
    );

    let outcome = relocator.move_to_out_async(done).await?;
    assert!(matches!(outcome, RelocationOutcome::SourceMissing { .. }));

    let again = base.join("in").join("good.txt");
    write_file(&again, "good v2");
    let outcome = relocator.replace_to_error_async(again).await?;
    assert!(matches!(outcome, RelocationOutcome::Moved { .. }));
    Ok(())
}

#[test]
fn test_real_concurrent_moves_of_same_source_keep_one_copy() -> TestResult {
    for _ in 0..50 {
        let root = tempfile::tempdir()?;
        let base = root.path().canonicalize()?;
        let source = base.join("in").join("report.csv");
        write_file(&source, "only");

        // Clocks a millisecond apart give the two callers different names.
        let early = Relocator::new(Arc::new(RealFileSystem), Arc::new(clock_at(14, 7, 3, 512)));
        let late = Relocator::new(Arc::new(RealFileSystem), Arc::new(clock_at(14, 7, 3, 513)));
        let barrier = Barrier::new(2);

        let outcomes = std::thread::scope(|s| {
            let a = s.spawn(|| {
                barrier.wait();
                early.move_to_out(&source)
            });
            let b = s.spawn(|| {
                barrier.wait();
                late.move_to_out(&source)
            });
            [a.join().unwrap(), b.join().unwrap()]
        });

        let outcomes = outcomes.into_iter().collect::<Result<Vec<_>, _>>()?;
        let moved = outcomes
            .iter()
            .filter(|o| matches!(o, RelocationOutcome::Moved { .. }))
            .count();
        let missing = outcomes
            .iter()
            .filter(|o| matches!(o, RelocationOutcome::SourceMissing { .. }))
            .count();
        assert_eq!((moved, missing), (1, 1), "outcomes: {outcomes:?}");

        let landed: Vec<_> = std::fs::read_dir(base.join("out/2024/3/5"))?
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(landed.len(), 1, "file landed at more than one destination");
        assert!(!source.exists());
    }
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_symlinked_inbox_relocates_next_to_its_target() -> TestResult {
    let root = tempfile::tempdir()?;
    let base = root.path().canonicalize()?;
    let real_inbox = base.join("site").join("in");
    std::fs::create_dir_all(&real_inbox)?;
    std::os::unix::fs::symlink(&real_inbox, base.join("inbox"))?;
    write_file(&real_inbox.join("a.csv"), "a");

    let outcome = real_relocator().move_to_out(base.join("inbox").join("a.csv"))?;

    assert_eq!(
        outcome,
        RelocationOutcome::Moved {
            to: base.join("site/out/2024/3/5/[14.7.3.512][a].csv"),
        }
    );
    assert!(!base.join("out").exists());
    Ok(())
}

#[test]
fn test_copy_no_clobber_moves_without_hard_links() -> TestResult {
    let root = tempfile::tempdir()?;
    let from = root.path().join("from.csv");
    let to = root.path().join("to.csv");
    write_file(&from, "payload");

    assert_eq!(copy_no_clobber(&from, &to)?, MoveOutcome::Moved);
    assert_eq!(std::fs::read_to_string(&to)?, "payload");
    assert!(!from.exists());

    // The source is gone now; a second attempt must not touch the copy.
    assert_eq!(copy_no_clobber(&from, &to)?, MoveOutcome::SourceGone);
    assert_eq!(std::fs::read_to_string(&to)?, "payload");
    Ok(())
}

#[test]
fn test_copy_no_clobber_refuses_occupied_destination() -> TestResult {
    let root = tempfile::tempdir()?;
    let from = root.path().join("from.csv");
    let to = root.path().join("to.csv");
    write_file(&from, "new");
    write_file(&to, "old");

    assert_eq!(copy_no_clobber(&from, &to)?, MoveOutcome::Occupied);
    assert_eq!(std::fs::read_to_string(&to)?, "old");
    assert_eq!(std::fs::read_to_string(&from)?, "new");
    Ok(())
}

#[test]
fn test_copy_over_replaces_destination_content() -> TestResult {
    let root = tempfile::tempdir()?;
    let source = root.path().join("in").join("report.csv");
    let destination = root.path().join("out").join("report.csv");
    write_file(&source, "new");
    write_file(&destination, "old");

    copy_over(&source, &destination)?;

    assert_eq!(std::fs::read_to_string(&destination)?, "new");
    assert!(!source.exists());
    let leftovers: Vec<_> = std::fs::read_dir(root.path().join("out"))?
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(leftovers.len(), 1);
    Ok(())
}

#[test]
fn test_real_move_no_clobber_reports_vanished_source() -> TestResult {
    let root = tempfile::tempdir()?;
    let to = root.path().join("to.csv");

    let outcome = RealFileSystem.move_no_clobber(&root.path().join("missing.csv"), &to)?;

    assert_eq!(outcome, MoveOutcome::SourceGone);
    assert!(!to.exists());
    Ok(())
}
