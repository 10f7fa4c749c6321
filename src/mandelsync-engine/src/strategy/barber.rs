use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use super::Transport;
use crate::{ConfigurationError, Message, SynchronizationFailure, WorkerId};

#[derive(Debug)]
struct Room {
    queue: VecDeque<Message>,
    closed: bool,
    peak: usize,
}

/// Bounded hand-off modelled after the sleeping barber.
///
/// Workers are the customers: they take a seat in the waiting room or
/// block while every seat is taken. The merger is the barber: it
/// sleeps while the room is empty and serves one message at a time.
#[derive(Debug)]
pub struct WaitingRoom {
    room: Mutex<Room>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl WaitingRoom {
    /// Creates a waiting room with `capacity` seats.
    pub fn new(capacity: usize) -> Result<Self, ConfigurationError> {
        if capacity == 0 {
            return Err(ConfigurationError::Capacity);
        }

        Ok(Self {
            room: Mutex::new(Room {
                queue: VecDeque::with_capacity(capacity),
                closed: false,
                peak: 0,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of occupied seats.
    pub fn len(&self) -> usize {
        self.room.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.room.lock().queue.is_empty()
    }

    /// The highest number of seats that were ever occupied at once.
    pub fn peak(&self) -> usize {
        self.room.lock().peak
    }

    /// Takes a seat, blocking while the room is full.
    pub fn push(&self, message: Message) -> Result<(), SynchronizationFailure> {
        let mut room = self.room.lock();
        while room.queue.len() >= self.capacity && !room.closed {
            self.not_full.wait(&mut room);
        }

        if room.closed {
            return Err(SynchronizationFailure::Disconnected);
        }

        room.queue.push_back(message);
        room.peak = room.peak.max(room.queue.len());
        self.not_empty.notify_one();

        Ok(())
    }

    /// Serves the next customer, sleeping while the room is empty.
    pub fn pop(&self) -> Result<Message, SynchronizationFailure> {
        let mut room = self.room.lock();
        loop {
            if room.closed {
                return Err(SynchronizationFailure::Disconnected);
            }

            if let Some(message) = room.queue.pop_front() {
                self.not_full.notify_one();
                return Ok(message);
            }

            self.not_empty.wait(&mut room);
        }
    }
}

impl Transport for WaitingRoom {
    fn send(&self, _worker: WorkerId, message: Message) -> Result<(), SynchronizationFailure> {
        self.push(message)
    }

    fn recv(&self) -> Result<Message, SynchronizationFailure> {
        self.pop()
    }

    fn close(&self) {
        self.room.lock().closed = true;
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }
}
