//! Row-partitioned parallel Mandelbrot rendering.
//!
//! # Design
//!
//! A run splits the image height into contiguous row ranges, one per
//! worker. Workers compute their rows in ascending order and hand each
//! finished row to a [`Transport`], followed by a completion marker.
//!
//! A single [`Merger`] on the coordinating thread drains the transport
//! and is the only code that ever writes to the [`ImageBuffer`]. This
//! makes the "every pixel is written once" guarantee hold without any
//! per-pixel locking.
//!
//! The transport is selected through [`Strategy`] and comes in three
//! flavors which only differ in how producers synchronize with the
//! consumer:
//!
//! - an unbounded queue where producers never block,
//! - dining philosophers, where every hand-off requires holding two
//!   ring-arranged forks,
//! - a sleeping barber waiting room with a fixed capacity.
//!
//! Workers run either as threads of a pool or as child processes
//! speaking the [`process`] protocol; the result is the same image.

#![deny(rust_2018_idioms, rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub use mandelsync_bmp::Color;

mod coordinator;
pub use coordinator::*;

mod error;
pub use error::*;

mod image;
pub use image::ImageBuffer;

mod merger;
pub use merger::Merger;

mod message;
pub use message::*;

mod partition;
pub use partition::*;

pub mod process;

pub mod sink;

pub mod strategy;
pub use strategy::{Strategy, Transport};

mod summary;
pub use summary::*;

mod viewport;
pub use viewport::*;

mod worker;
pub use worker::*;
