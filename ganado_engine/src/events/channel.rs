//! Async fan-in channel behind the lifecycle hooks.
//!
//! The engine publishes through cheap, cloneable [`EventProducer`] handles; a single [`EventHandler`]
//! task consumes the stream and runs the registered callback for each event. Callbacks only ever see the
//! event value itself, never engine state, and may be async.
//!
//! The handler shuts down once every producer handle has been dropped, after waiting for callbacks still
//! in flight.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    receiver: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer { sender: self.sender.clone() }
    }

    /// Consumes events until the channel closes, then drains the callbacks that are still running.
    ///
    /// Each callback runs on its own task, so a slow subscriber delays shutdown but never delays the
    /// next event.
    pub async fn start_handler(mut self) {
        debug!("📬️ Event handler running");
        // The handler keeps a sender of its own so that subscribe() works after construction. It must go
        // before the receive loop starts, or the channel never closes.
        drop(self.sender);
        let mut in_flight = JoinSet::new();
        while let Some(event) = self.receiver.recv().await {
            trace!("📬️ Dispatching event");
            let callback = Arc::clone(&self.handler);
            in_flight.spawn(async move { (callback)(event).await });
            while let Some(finished) = in_flight.try_join_next() {
                if let Err(e) = finished {
                    warn!("📬️ An event callback panicked: {e}");
                }
            }
        }
        debug!("📬️ All producers dropped. {} callback(s) still in flight", in_flight.len());
        while let Some(finished) = in_flight.join_next().await {
            if let Err(e) = finished {
                warn!("📬️ An event callback panicked: {e}");
            }
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to publish event: {e}");
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::events::EventType;

    #[tokio::test]
    async fn events_from_all_producers_reach_the_callback() {
        let _ = env_logger::try_init();
        let annulled = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));
        let (annulled_count, completed_count) = (annulled.clone(), completed.clone());
        let callback = Arc::new(move |event: EventType| {
            let (annulled, completed) = (annulled.clone(), completed.clone());
            Box::pin(async move {
                debug!("Callback received {event:?}");
                match event {
                    EventType::OrderAnnulled => {
                        annulled.fetch_add(1, Ordering::SeqCst);
                    },
                    EventType::OrderCompleted => {
                        completed.fetch_add(1, Ordering::SeqCst);
                    },
                    EventType::OrderAccepted => {},
                }
                tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        let handler = EventHandler::new(2, callback);
        let cancellations = handler.subscribe();
        let completions = handler.subscribe();
        tokio::spawn(async move {
            for _ in 0..4 {
                cancellations.publish_event(EventType::OrderAnnulled).await;
            }
        });
        tokio::spawn(async move {
            for _ in 0..3 {
                completions.publish_event(EventType::OrderCompleted).await;
            }
        });

        // Returns only after both producers are gone and every callback has finished.
        handler.start_handler().await;
        assert_eq!(annulled_count.load(Ordering::SeqCst), 4);
        assert_eq!(completed_count.load(Ordering::SeqCst), 3);
    }
}
