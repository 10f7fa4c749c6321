use mandelsync_engine::{partition, ConfigurationError, RowTask};

fn assert_covers(tasks: &[RowTask], height: u32) {
    let mut next = 0;
    for (i, task) in tasks.iter().enumerate() {
        assert_eq!(task.worker, i);
        assert_eq!(task.start, next, "gap or overlap before worker {i}");
        assert!(!task.is_empty());
        next = task.end;
    }
    assert_eq!(next, height);
}

#[test]
fn even_split() -> Result<(), ConfigurationError> {
    let tasks = partition(600, 4)?;

    assert_eq!(tasks.len(), 4);
    assert!(tasks.iter().all(|t| t.len() == 150));
    assert_covers(&tasks, 600);

    Ok(())
}

#[test]
fn last_worker_takes_remainder() -> Result<(), ConfigurationError> {
    let tasks = partition(10, 3)?;

    assert_eq!(
        tasks.iter().map(|t| (t.start, t.end)).collect::<Vec<_>>(),
        [(0, 3), (3, 6), (6, 10)]
    );

    Ok(())
}

#[test]
fn complete_for_every_worker_count() -> Result<(), ConfigurationError> {
    for height in [1, 2, 7, 64, 97] {
        for workers in 1..=height as usize {
            let tasks = partition(height, workers)?;
            assert_eq!(tasks.len(), workers);
            assert_covers(&tasks, height);

            let total: u32 = tasks.iter().map(RowTask::len).sum();
            assert_eq!(total, height);
        }
    }

    Ok(())
}

#[test]
fn rejects_bad_worker_counts() {
    assert_eq!(
        partition(10, 0),
        Err(ConfigurationError::Workers {
            workers: 0,
            height: 10
        })
    );
    assert_eq!(
        partition(10, 11),
        Err(ConfigurationError::Workers {
            workers: 11,
            height: 10
        })
    );
}
