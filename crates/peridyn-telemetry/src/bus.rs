//! Event bus: solver events fanned out to pluggable sinks.
//!
//! Workers (threads or ranks) hold clones of the bus sender and push
//! events while the job runs. The owner of the bus drains the channel
//! with [`EventBus::flush`] and every sink sees every event in emission
//! order.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::events::SimulationEvent;
use crate::sinks::EventSink;

/// Channel plus the sinks its events are dispatched to.
pub struct EventBus {
    sender: Sender<SimulationEvent>,
    receiver: Receiver<SimulationEvent>,
    sinks: Vec<Box<dyn EventSink>>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            sinks: Vec::new(),
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// A sender the solver emits through from any worker.
    pub fn sender(&self) -> Sender<SimulationEvent> {
        self.sender.clone()
    }

    /// Queues an event from the owning thread.
    pub fn emit(&self, event: SimulationEvent) {
        // the receiver lives in `self`, so the channel is never closed here
        let _ = self.sender.send(event);
    }

    /// Dispatches pending events; returns how many were dispatched.
    pub fn flush(&mut self) -> usize {
        let mut dispatched = 0;
        while let Ok(event) = self.receiver.try_recv() {
            for sink in &mut self.sinks {
                sink.handle(&event);
            }
            dispatched += 1;
        }
        dispatched
    }

    /// Flushes and finalizes every sink. Call once when the job ended.
    pub fn finish(&mut self) {
        self.flush();
        for sink in &mut self.sinks {
            sink.finalize();
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
