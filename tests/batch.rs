use std::sync::Mutex;
use std::time::Duration;

use fondra::{BatchOptions, BatchTask, CancelToken, FondraError, GenerationConfig, run_batch};

fn task(index: usize, width: u32, height: u32) -> BatchTask {
    let mut config = GenerationConfig::new(width, height);
    config.seed = Some(1000 + index as u64);
    BatchTask {
        config,
        dest: format!("out/background_{index:04}.png"),
        index,
    }
}

#[test]
fn failure_isolation_keeps_siblings_alive() {
    let tasks: Vec<BatchTask> = (0..10)
        .map(|i| {
            if i == 4 {
                task(i, 0, 32) // invalid: zero width
            } else {
                task(i, 48, 32)
            }
        })
        .collect();

    let (reports, stats) = run_batch(tasks, &BatchOptions::default(), |_, _| {}).unwrap();

    assert_eq!(stats.total, 10);
    assert_eq!(stats.completed, 9);
    assert_eq!(stats.failed, 1);

    // reports come back ordered by task index regardless of completion order
    let indices: Vec<usize> = reports.iter().map(|r| r.index).collect();
    assert_eq!(indices, (0..10).collect::<Vec<_>>());

    assert!(!reports[4].succeeded());
    assert!(matches!(
        reports[4].outcome,
        Err(FondraError::ConfigInvalid(_))
    ));
    for (i, report) in reports.iter().enumerate() {
        if i != 4 {
            let img = report.outcome.as_ref().unwrap();
            assert_eq!(img.data.len(), 48 * 32 * 3);
        }
    }
}

#[test]
fn seeded_tasks_render_identically_across_batches() {
    let make = || (0..4).map(|i| task(i, 40, 30)).collect::<Vec<_>>();
    let (a, _) = run_batch(make(), &BatchOptions::default(), |_, _| {}).unwrap();
    let (b, _) = run_batch(make(), &BatchOptions::default(), |_, _| {}).unwrap();
    for (ra, rb) in a.iter().zip(&b) {
        assert_eq!(
            ra.outcome.as_ref().unwrap().data,
            rb.outcome.as_ref().unwrap().data
        );
    }
}

#[test]
fn pre_cancelled_batch_runs_nothing() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let options = BatchOptions {
        cancel,
        ..Default::default()
    };
    let tasks: Vec<BatchTask> = (0..6).map(|i| task(i, 32, 32)).collect();
    let (reports, stats) = run_batch(tasks, &options, |_, _| {}).unwrap();
    assert_eq!(stats.failed, 6);
    assert!(
        reports
            .iter()
            .all(|r| matches!(r.outcome, Err(FondraError::Cancelled(_))))
    );
}

#[test]
fn elapsed_deadline_cancels_remaining_tasks() {
    let options = BatchOptions {
        deadline: Some(Duration::ZERO),
        ..Default::default()
    };
    let tasks: Vec<BatchTask> = (0..4).map(|i| task(i, 32, 32)).collect();
    let (reports, _) = run_batch(tasks, &options, |_, _| {}).unwrap();
    assert!(
        reports
            .iter()
            .all(|r| matches!(r.outcome, Err(FondraError::Cancelled(_))))
    );
}

#[test]
fn progress_reports_are_monotonic_and_terminal() {
    let calls: Mutex<Vec<(usize, usize)>> = Mutex::new(Vec::new());
    let options = BatchOptions {
        progress_every: 3,
        workers: Some(1),
        ..Default::default()
    };
    let tasks: Vec<BatchTask> = (0..7).map(|i| task(i, 24, 24)).collect();
    run_batch(tasks, &options, |done, total| {
        calls.lock().unwrap().push((done, total));
    })
    .unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls.last(), Some(&(7, 7)));
    let dones: Vec<usize> = calls.iter().map(|&(d, _)| d).collect();
    let mut sorted = dones.clone();
    sorted.sort_unstable();
    assert_eq!(dones, sorted);
}
