use bevy::prelude::*;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Results posted by background work, drained once per frame on the main thread.
#[derive(Resource)]
pub struct Inbox<T: Send + 'static>(Arc<Mutex<Vec<T>>>);

impl<T: Send + 'static> Default for Inbox<T> {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }
}

impl<T: Send + 'static> Clone for Inbox<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Send + 'static> Inbox<T> {
    pub fn push(&self, item: T) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push(item);
        }
    }

    pub fn drain(&self) -> Vec<T> {
        self.0
            .lock()
            .map(|mut queue| std::mem::take(&mut *queue))
            .unwrap_or_default()
    }
}

/// Run async work off the frame loop.
#[cfg(target_arch = "wasm32")]
pub fn spawn_task<F, Fut>(make: F)
where
    F: FnOnce() -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(make());
}

/// Run async work off the frame loop.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_task<F, Fut>(make: F)
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()>,
{
    std::thread::spawn(move || pollster::block_on(make()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_inbox() {
        let inbox = Inbox::<u32>::default();
        let sender = inbox.clone();
        sender.push(1);
        sender.push(2);
        assert_eq!(inbox.drain(), vec![1, 2]);
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn test_native_task_posts_result() {
        let inbox = Inbox::<&'static str>::default();
        let sender = inbox.clone();
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        spawn_task(move || async move {
            sender.push("loaded");
            let _ = done_tx.send(());
        });
        done_rx.recv().unwrap();
        assert_eq!(inbox.drain(), vec!["loaded"]);
    }
}
