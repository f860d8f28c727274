//! Point-to-point communication between ranks.
//!
//! [`Communicator`] is the narrow surface the distributed data handler
//! needs: tagged sends, matched receives and an all-reduce. An MPI
//! binding implements it over a real communicator; [`ChannelWorld`]
//! implements it in-process with one thread per rank, which is what the
//! CLI and the tests run.

use std::collections::{HashMap, VecDeque};
use std::sync::mpsc;
use std::sync::{Arc, OnceLock};
use std::thread;

use peridyn_types::{PeridynError, PeridynResult};

use crate::data_handler::ReduceOp;

/// Tag reserved for reductions.
pub const REDUCE_TAG: u32 = 1000;
/// Tag reserved for gathers.
pub const GATHER_TAG: u32 = 1001;

/// Message passing between the ranks of a job.
///
/// Messages between one pair of ranks with one tag arrive in send order.
pub trait Communicator: Send {
    /// This rank.
    fn rank(&self) -> usize;

    /// Number of ranks.
    fn size(&self) -> usize;

    /// Sends `data` to `dest`. Does not wait for the receiver.
    fn send(&self, dest: usize, tag: u32, data: Vec<f64>) -> PeridynResult<()>;

    /// Blocks until a message from `src` with `tag` arrives.
    fn recv(&mut self, src: usize, tag: u32) -> PeridynResult<Vec<f64>>;

    /// Tells every other rank that this rank failed.
    fn abort(&self);

    /// Combines one value per rank; every rank receives the result.
    ///
    /// Values are folded in rank order.
    fn all_reduce(&mut self, value: f64, op: ReduceOp) -> PeridynResult<f64> {
        let (rank, size) = (self.rank(), self.size());
        for dest in (0..size).filter(|&d| d != rank) {
            self.send(dest, REDUCE_TAG, vec![value])?;
        }
        let mut acc = op.identity();
        for src in 0..size {
            let v = if src == rank {
                value
            } else {
                let msg = self.recv(src, REDUCE_TAG)?;
                match msg.as_slice() {
                    [v] => *v,
                    _ => {
                        return Err(PeridynError::Transport(format!(
                            "Rank {rank}: reduction message from rank {src} has {} values",
                            msg.len()
                        )))
                    }
                }
            };
            acc = op.apply(acc, v);
        }
        Ok(acc)
    }
}

enum Message {
    Data { src: usize, tag: u32, data: Vec<f64> },
    Abort { src: usize },
}

/// In-process communicator backed by `std::sync::mpsc` channels.
pub struct ChannelComm {
    rank: usize,
    senders: Vec<Option<mpsc::Sender<Message>>>,
    receiver: mpsc::Receiver<Message>,
    /// Messages received while waiting for another (source, tag).
    stash: HashMap<(usize, u32), VecDeque<Vec<f64>>>,
    first_failure: Arc<OnceLock<usize>>,
}

impl Communicator for ChannelComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.senders.len()
    }

    fn send(&self, dest: usize, tag: u32, data: Vec<f64>) -> PeridynResult<()> {
        let sender = self
            .senders
            .get(dest)
            .and_then(Option::as_ref)
            .ok_or_else(|| {
                PeridynError::Transport(format!("Rank {}: invalid destination {dest}", self.rank))
            })?;
        sender
            .send(Message::Data {
                src: self.rank,
                tag,
                data,
            })
            .map_err(|_| {
                PeridynError::Transport(format!("Rank {}: rank {dest} hung up", self.rank))
            })
    }

    fn recv(&mut self, src: usize, tag: u32) -> PeridynResult<Vec<f64>> {
        if let Some(data) = self.stash.get_mut(&(src, tag)).and_then(VecDeque::pop_front) {
            return Ok(data);
        }
        loop {
            match self.receiver.recv() {
                Ok(Message::Data { src: s, tag: t, data }) if s == src && t == tag => {
                    return Ok(data)
                }
                Ok(Message::Data { src: s, tag: t, data }) => {
                    self.stash.entry((s, t)).or_default().push_back(data);
                }
                Ok(Message::Abort { src: s }) => {
                    return Err(PeridynError::Transport(format!(
                        "Rank {}: rank {s} aborted",
                        self.rank
                    )))
                }
                Err(_) => {
                    return Err(PeridynError::Transport(format!(
                        "Rank {}: all peers hung up while waiting for rank {src}",
                        self.rank
                    )))
                }
            }
        }
    }

    fn abort(&self) {
        let _ = self.first_failure.set(self.rank);
        for sender in self.senders.iter().flatten() {
            let _ = sender.send(Message::Abort { src: self.rank });
        }
    }
}

/// A set of connected in-process ranks.
pub struct ChannelWorld;

impl ChannelWorld {
    /// Creates `n_ranks` connected communicators, in rank order.
    pub fn create(n_ranks: usize) -> Vec<ChannelComm> {
        Self::create_shared(n_ranks, Arc::new(OnceLock::new()))
    }

    fn create_shared(n_ranks: usize, first_failure: Arc<OnceLock<usize>>) -> Vec<ChannelComm> {
        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..n_ranks).map(|_| mpsc::channel::<Message>()).unzip();
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, receiver)| ChannelComm {
                rank,
                // No sender to itself: once every peer is gone, `recv` fails
                // instead of blocking forever.
                senders: senders
                    .iter()
                    .enumerate()
                    .map(|(dest, s)| (dest != rank).then(|| s.clone()))
                    .collect(),
                receiver,
                stash: HashMap::new(),
                first_failure: Arc::clone(&first_failure),
            })
            .collect()
    }

    /// Runs `f` on `n_ranks` ranks, one thread each, and returns the
    /// per-rank results in rank order.
    ///
    /// A rank whose `f` fails aborts the others; the error of the first
    /// failing rank is returned.
    pub fn run<T, F>(n_ranks: usize, f: F) -> PeridynResult<Vec<T>>
    where
        T: Send,
        F: Fn(&mut ChannelComm) -> PeridynResult<T> + Sync,
    {
        if n_ranks == 0 {
            return Err(PeridynError::Transport("At least one rank is required".into()));
        }
        let first_failure = Arc::new(OnceLock::new());
        let comms = Self::create_shared(n_ranks, Arc::clone(&first_failure));
        let f = &f;

        let results: Vec<PeridynResult<T>> = thread::scope(|scope| {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|mut comm| {
                    thread::Builder::new()
                        .name(format!("peridyn-rank-{}", comm.rank))
                        .spawn_scoped(scope, move || {
                            let result = f(&mut comm);
                            if result.is_err() {
                                comm.abort();
                            }
                            result
                        })
                })
                .collect();
            handles
                .into_iter()
                .enumerate()
                .map(|(rank, handle)| match handle {
                    Ok(handle) => handle.join().unwrap_or_else(|_| {
                        Err(PeridynError::Transport(format!("Rank {rank} panicked")))
                    }),
                    Err(e) => Err(PeridynError::Transport(format!(
                        "Cannot spawn rank {rank}: {e}"
                    ))),
                })
                .collect()
        });

        let failed = first_failure.get().copied();
        let mut out = Vec::with_capacity(n_ranks);
        let mut first_err = None;
        for (rank, result) in results.into_iter().enumerate() {
            match result {
                Ok(value) => out.push(value),
                Err(e) if failed == Some(rank) => return Err(e),
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(out),
        }
    }
}

impl<T: Communicator + ?Sized> Communicator for &mut T {
    fn rank(&self) -> usize {
        (**self).rank()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn send(&self, dest: usize, tag: u32, data: Vec<f64>) -> PeridynResult<()> {
        (**self).send(dest, tag, data)
    }

    fn recv(&mut self, src: usize, tag: u32) -> PeridynResult<Vec<f64>> {
        (**self).recv(src, tag)
    }

    fn abort(&self) {
        (**self).abort()
    }

    fn all_reduce(&mut self, value: f64, op: ReduceOp) -> PeridynResult<f64> {
        (**self).all_reduce(value, op)
    }
}
