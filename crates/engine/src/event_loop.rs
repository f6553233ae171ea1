//! The single event thread.
//!
//! Source events, push outcomes and the mode memory deadline are all
//! serviced here, so aggregator state is never shared.

use std::time::{Duration, Instant};

use crossbeam_channel::{never, select, Receiver};
use modeglue_ax::Accessibility;
use modeglue_events::SourceEvent;
use modeglue_variables::PushOutcome;

use crate::aggregator::{Flow, ModeAggregator};

/// Wait used when no timer is armed.
const IDLE_WAIT: Duration = Duration::from_secs(1);

pub struct EventLoop<A: Accessibility> {
    aggregator: ModeAggregator<A>,
    events: Receiver<SourceEvent>,
    done: Receiver<PushOutcome>,
}

impl<A: Accessibility> EventLoop<A> {
    pub fn new(
        aggregator: ModeAggregator<A>,
        events: Receiver<SourceEvent>,
        done: Receiver<PushOutcome>,
    ) -> Self {
        Self {
            aggregator,
            events,
            done,
        }
    }

    pub fn aggregator(&self) -> &ModeAggregator<A> {
        &self.aggregator
    }

    pub fn aggregator_mut(&mut self) -> &mut ModeAggregator<A> {
        &mut self.aggregator
    }

    /// Process events until shutdown is requested or every sender is gone.
    pub fn run(&mut self) {
        tracing::info!("event loop started");

        loop {
            let now = Instant::now();
            self.aggregator.tick(now);
            let wait = self
                .aggregator
                .deadline()
                .map(|deadline| deadline.saturating_duration_since(now))
                .unwrap_or(IDLE_WAIT);
            let mut worker_gone = false;

            let flow = select! {
                recv(self.events) -> event => match event {
                    Ok(event) => self.aggregator.handle(event, Instant::now()),
                    Err(_) => {
                        tracing::info!("all event sources gone");
                        Flow::Shutdown
                    }
                },
                recv(self.done) -> outcome => {
                    match outcome {
                        Ok(outcome) => self.aggregator.on_push_complete(outcome),
                        Err(_) => {
                            tracing::warn!("push worker gone");
                            worker_gone = true;
                        }
                    }
                    Flow::Continue
                },
                default(wait) => Flow::Continue,
            };

            if worker_gone {
                self.done = never();
            }
            if flow == Flow::Shutdown {
                break;
            }
        }

        tracing::info!("event loop stopped");
    }

    /// Tear down the aggregator: drain the push in flight, if any, and
    /// reset every variable.
    pub fn shutdown(&mut self, timeout: Duration) {
        self.aggregator.shutdown(&self.done, timeout);
    }
}
