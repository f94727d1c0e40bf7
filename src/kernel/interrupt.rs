// src/kernel/interrupt.rs

use std::sync::Arc;

use tokio::sync::watch;

/// Create a connected interrupt handle / listener pair.
pub fn interrupt_channel() -> (InterruptHandle, InterruptListener) {
    let (tx, rx) = watch::channel(0u64);
    (
        InterruptHandle { tx: Arc::new(tx) },
        InterruptListener { rx },
    )
}

/// Host side: asks the running request to abort.
///
/// Cheap to clone; the request reader and the SIGINT listener each hold one.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    tx: Arc<watch::Sender<u64>>,
}

impl InterruptHandle {
    pub fn interrupt(&self) {
        self.tx.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    pub fn listener(&self) -> InterruptListener {
        InterruptListener {
            rx: self.tx.subscribe(),
        }
    }
}

/// Kernel side.
#[derive(Debug)]
pub struct InterruptListener {
    rx: watch::Receiver<u64>,
}

impl InterruptListener {
    /// Forget interrupts that arrived while nothing was running.
    pub fn clear(&mut self) {
        self.rx.borrow_and_update();
    }

    /// Resolve on the next interrupt. Cancel-safe.
    ///
    /// Never resolves once every handle is gone.
    pub async fn interrupted(&mut self) {
        if self.rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn cleared_interrupts_do_not_fire() {
        let (handle, mut listener) = interrupt_channel();
        handle.interrupt();
        listener.clear();

        let fired = tokio::time::timeout(Duration::from_millis(50), listener.interrupted()).await;
        assert!(fired.is_err(), "stale interrupt leaked into a new wait");
    }

    #[tokio::test]
    async fn interrupt_wakes_waiting_listener() {
        let (handle, mut listener) = interrupt_channel();
        listener.clear();

        let waiter = tokio::spawn(async move {
            listener.interrupted().await;
        });
        handle.interrupt();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("listener was not woken")
            .unwrap();
    }
}
