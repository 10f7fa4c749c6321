use std::{thread, time::Duration};

use mandelsync_engine::{
    strategy::{
        acquisition_table, AcquisitionOrder, DiningPhilosophers, UnboundedQueue, WaitingRoom,
    },
    Color, Message, RowResult, Strategy, SynchronizationFailure, Transport, WorkerId,
};
use rand::Rng;

fn row(worker: WorkerId, row: u32) -> Message {
    Message::Row {
        worker,
        result: RowResult {
            row,
            pixels: vec![Color::rgb(row as u8, 0, 0)],
        },
    }
}

/// Runs `workers` producers with `rows` rows each against `transport`
/// and returns every message in the order the consumer saw it.
fn exchange(transport: &dyn Transport, workers: usize, rows: u32, jitter: bool) -> Vec<Message> {
    thread::scope(|s| {
        for worker in 0..workers {
            s.spawn(move || {
                let mut rng = rand::thread_rng();
                for i in 0..rows {
                    if jitter {
                        thread::sleep(Duration::from_micros(rng.gen_range(0..200)));
                    }

                    let index = worker as u32 * rows + i;
                    transport.send(worker, row(worker, index)).unwrap();
                }
                transport.send(worker, Message::Done { worker }).unwrap();
            });
        }

        let mut received = Vec::new();
        let mut done = 0;
        while done < workers {
            let message = transport.recv().unwrap();
            if matches!(message, Message::Done { .. }) {
                done += 1;
            }
            received.push(message);
        }
        received
    })
}

/// Checks that every row arrived exactly once and that each worker's
/// rows arrived in ascending order before its completion marker.
fn assert_delivered(received: &[Message], workers: usize, rows: u32) {
    let mut next: Vec<u32> = (0..workers as u32).map(|w| w * rows).collect();
    let mut finished = vec![false; workers];

    for message in received {
        match message {
            Message::Row { worker, result } => {
                let worker = *worker;
                assert_eq!(worker, (result.row / rows) as WorkerId);
                assert!(!finished[worker], "row {} after completion", result.row);
                assert_eq!(result.row, next[worker], "row lost, duplicated or reordered");
                next[worker] += 1;
            }
            Message::Done { worker } => {
                assert!(!finished[*worker]);
                finished[*worker] = true;
            }
            Message::Abort { worker } => panic!("unexpected abort from {worker}"),
        }
    }

    assert!(finished.iter().all(|f| *f));
    for (worker, next) in next.into_iter().enumerate() {
        assert_eq!(next, (worker as u32 + 1) * rows);
    }
}

#[test]
fn acquisition_order_breaks_the_cycle() {
    assert_eq!(
        acquisition_table(4),
        [
            AcquisitionOrder {
                first: 0,
                second: 1
            },
            AcquisitionOrder {
                first: 1,
                second: 2
            },
            AcquisitionOrder {
                first: 2,
                second: 3
            },
            AcquisitionOrder {
                first: 0,
                second: 3
            },
        ]
    );

    assert_eq!(
        acquisition_table(1),
        [AcquisitionOrder {
            first: 0,
            second: 0
        }]
    );

    // Locking in table order must never wait on a lower fork while
    // holding a higher one, which rules out a circular wait.
    for n in 2..16 {
        for order in acquisition_table(n) {
            assert!(order.first < order.second);
        }
    }
}

#[test]
fn unbounded_queue_delivers_everything() {
    let queue = UnboundedQueue::new();
    let received = exchange(&queue, 8, 50, false);

    assert_delivered(&received, 8, 50);
    assert!(queue.is_empty());
}

#[test]
fn philosophers_never_deadlock() {
    for workers in [1, 2, 3, 5, 8] {
        for _ in 0..10 {
            let table = DiningPhilosophers::new(workers);
            let received = exchange(&table, workers, 20, true);
            assert_delivered(&received, workers, 20);
        }
    }
}

#[test]
fn philosophers_reject_strangers() {
    let table = DiningPhilosophers::new(2);

    assert_eq!(
        table.send(2, row(2, 0)),
        Err(SynchronizationFailure::UnknownWorker(2))
    );
    // Markers do not need forks.
    assert_eq!(table.send(7, Message::Done { worker: 7 }), Ok(()));
}

#[test]
fn waiting_room_bounds_occupancy() {
    let workers = 4;
    let rows = 16;
    let height = workers as u32 * rows;

    for capacity in (1..=height as usize).chain([height as usize * 2]) {
        let room = WaitingRoom::new(capacity).unwrap();
        let received = exchange(&room, workers, rows, capacity % 7 == 1);

        assert_delivered(&received, workers, rows);
        assert!(room.peak() <= capacity);
        assert!(room.peak() >= 1);
        assert!(room.is_empty());
    }
}

#[test]
fn waiting_room_rejects_zero_capacity() {
    assert!(WaitingRoom::new(0).is_err());
    assert!(Strategy::SleepingBarber { capacity: 0 }.build(1).is_err());
}

#[test]
fn close_wakes_blocked_producer() {
    let room = WaitingRoom::new(1).unwrap();
    room.push(row(0, 0)).unwrap();

    thread::scope(|s| {
        let blocked = s.spawn(|| room.send(0, row(0, 1)));

        thread::sleep(Duration::from_millis(50));
        room.close();

        assert_eq!(
            blocked.join().unwrap(),
            Err(SynchronizationFailure::Disconnected)
        );
    });

    assert_eq!(room.recv(), Err(SynchronizationFailure::Disconnected));
}

#[test]
fn close_wakes_blocked_consumer() {
    for strategy in [
        Strategy::UnboundedQueue,
        Strategy::DiningPhilosophers,
        Strategy::sleeping_barber(),
    ] {
        let transport = strategy.build(2).unwrap();

        thread::scope(|s| {
            let blocked = s.spawn(|| transport.recv());

            thread::sleep(Duration::from_millis(50));
            transport.close();

            assert_eq!(
                blocked.join().unwrap(),
                Err(SynchronizationFailure::Disconnected)
            );
        });

        assert_eq!(
            transport.send(0, Message::Done { worker: 0 }),
            Err(SynchronizationFailure::Disconnected)
        );
    }
}

#[test]
fn strategy_names() {
    assert_eq!(Strategy::default(), Strategy::UnboundedQueue);
    assert_eq!(Strategy::DiningPhilosophers.to_string(), "dining-philosophers");
    assert_eq!(
        Strategy::sleeping_barber().to_string(),
        "sleeping-barber (16)"
    );
}
