use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Granularity of the session clocks
pub const TICK_RATE_MS: u64 = 100;

/// Unified event type consumed by the app loop
#[derive(Clone, Debug)]
pub enum QuizEvent {
    Key(KeyEvent),
    Resize,
    /// Time moved on by the given amount since the previous tick
    Tick(Duration),
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait QuizEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<QuizEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    tx.send(QuizEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => tx.send(QuizEvent::Resize),
                Ok(_) => Ok(()),
                Err(_) => break,
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Test event source fed from a channel
pub struct TestEventSource {
    rx: Receiver<QuizEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<QuizEvent>) -> Self {
        Self { rx }
    }
}

impl QuizEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that yields the next event, or a Tick carrying real elapsed time
pub struct Runner<E: QuizEventSource> {
    event_source: E,
    interval: Duration,
    last_tick: Instant,
}

impl<E: QuizEventSource> Runner<E> {
    pub fn new(event_source: E, interval: Duration) -> Self {
        Self {
            event_source,
            interval,
            last_tick: Instant::now(),
        }
    }

    /// Blocks until an event arrives or the tick interval is due.
    /// Key bursts cannot starve the clocks: a due tick always wins.
    pub fn step(&mut self) -> QuizEvent {
        let since = self.last_tick.elapsed();
        if since >= self.interval {
            return self.tick();
        }
        match self.event_source.recv_timeout(self.interval - since) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => self.tick(),
        }
    }

    fn tick(&mut self) -> QuizEvent {
        let now = Instant::now();
        let dt = now - self.last_tick;
        self.last_tick = now;
        QuizEvent::Tick(dt)
    }
}
