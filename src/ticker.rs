use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Periodic tick source for the stopwatch.
///
/// A background thread sends `message()` into `tx` once per period. Dropping
/// the ticker cancels the thread and joins it before returning.
pub struct Ticker {
    cancel: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn<T, F>(period: Duration, tx: Sender<T>, message: F) -> Self
    where
        T: Send + 'static,
        F: Fn() -> T + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || loop {
            match cancel_rx.recv_timeout(period) {
                Err(RecvTimeoutError::Timeout) => {
                    if tx.send(message()).is_err() {
                        break;
                    }
                }
                // Cancelled, or the ticker was dropped
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        debug!(?period, "ticker started");

        Self {
            cancel: Some(cancel_tx),
            handle: Some(handle),
        }
    }

    /// One tick per second
    pub fn every_second<T, F>(tx: Sender<T>, message: F) -> Self
    where
        T: Send + 'static,
        F: Fn() -> T + Send + 'static,
    {
        Self::spawn(Duration::from_secs(1), tx, message)
    }

    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Disconnecting wakes the thread immediately
        self.cancel.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("tick thread panicked");
            } else {
                debug!("ticker stopped");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_ticks_arrive() {
        let (tx, rx) = mpsc::channel();
        let ticker = Ticker::spawn(Duration::from_millis(10), tx, || 1u8);

        for _ in 0..3 {
            assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok(1));
        }
        drop(ticker);
    }

    #[test]
    fn test_cancel_is_prompt_and_final() {
        let (tx, rx) = mpsc::channel();
        let ticker = Ticker::spawn(Duration::from_secs(60), tx, || ());

        let started = Instant::now();
        ticker.cancel();
        assert!(started.elapsed() < Duration::from_secs(5));

        // The sender went away with the thread
        assert_eq!(rx.recv(), Err(mpsc::RecvError));
    }

    #[test]
    fn test_panicking_tick_source_still_shuts_down() {
        let (tx, rx) = mpsc::channel::<u8>();
        let ticker = Ticker::spawn(Duration::from_millis(5), tx, || panic!("tick source failed"));

        // The thread died, taking the sender with it
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Err(mpsc::RecvTimeoutError::Disconnected));
        ticker.cancel();
    }
}
