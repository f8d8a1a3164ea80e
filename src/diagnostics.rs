//! On-screen debug text fed from any thread.
//!
//! Producers push lines through a [`PaneSender`] (or the [`PaneLogger`]
//! installed as the `log` backend). The [`DebugPane`] itself is owned by the
//! main loop and only picks lines up when [`DebugPane::drain`] is called.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use log::{LevelFilter, Log, Metadata, Record};

#[derive(Debug, Clone)]
pub struct PaneSender {
    tx: Sender<String>,
}

impl PaneSender {
    /// Queues a line. Lines sent after the pane is dropped are discarded.
    pub fn send(&self, line: impl Into<String>) {
        let _ = self.tx.send(line.into());
    }
}

/// Per-frame numbers shown above the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    pub fps: f32,
    pub draw_calls: usize,
    pub quads: usize,
}

#[derive(Debug)]
pub struct DebugPane {
    rx: Receiver<String>,
    lines: VecDeque<String>,
    capacity: usize,
    stats: Option<FrameStats>,
}

impl DebugPane {
    /// A pane keeping the newest `capacity` lines.
    pub fn new(capacity: usize) -> (Self, PaneSender) {
        let (tx, rx) = mpsc::channel();
        let pane = Self {
            rx,
            lines: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            stats: None,
        };
        (pane, PaneSender { tx })
    }

    /// Moves every queued line into the ring; returns how many arrived.
    pub fn drain(&mut self) -> usize {
        let mut received = 0;
        loop {
            match self.rx.try_recv() {
                Ok(line) => {
                    if self.lines.len() == self.capacity {
                        self.lines.pop_front();
                    }
                    self.lines.push_back(line);
                    received += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        received
    }

    pub fn set_stats(&mut self, stats: FrameStats) {
        self.stats = Some(stats);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Stats line, if any, followed by the buffered lines oldest first.
    pub fn text(&self) -> String {
        let mut out = Vec::with_capacity(self.lines.len() + 1);
        if let Some(s) = &self.stats {
            out.push(format!(
                "FPS: {:.1} | draw calls: {} | quads: {}",
                s.fps, s.draw_calls, s.quads
            ));
        }
        out.extend(self.lines.iter().cloned());
        out.join("\n")
    }
}

/// `log` backend writing formatted records into a [`DebugPane`].
pub struct PaneLogger {
    sender: PaneSender,
    level: LevelFilter,
}

impl PaneLogger {
    pub fn new(sender: PaneSender, level: LevelFilter) -> Self {
        Self { sender, level }
    }

    /// Installs the logger globally. Fails if another logger is already set.
    pub fn install(sender: PaneSender, level: LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(Self::new(sender, level)))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for PaneLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.sender
                .send(format!("[{}] {}", record.level(), record.args()));
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn ring_keeps_newest_lines() {
        let (mut pane, tx) = DebugPane::new(2);
        for i in 0..3 {
            tx.send(format!("line {i}"));
        }
        assert_eq!(pane.drain(), 3);
        assert_eq!(pane.lines().collect::<Vec<_>>(), vec!["line 1", "line 2"]);
    }

    #[test]
    fn lines_cross_threads_and_wait_for_drain() {
        let (mut pane, tx) = DebugPane::new(4);
        let handle = std::thread::spawn(move || tx.send("from worker"));
        handle.join().unwrap();
        assert_eq!(pane.lines().count(), 0);
        pane.drain();
        pane.set_stats(FrameStats {
            fps: 60.0,
            draw_calls: 3,
            quads: 12,
        });
        assert_eq!(
            pane.text(),
            "FPS: 60.0 | draw calls: 3 | quads: 12\nfrom worker"
        );
    }

    #[test]
    fn logger_respects_level() {
        let (mut pane, tx) = DebugPane::new(4);
        let logger = PaneLogger::new(tx, LevelFilter::Warn);
        logger.log(
            &Record::builder()
                .level(Level::Info)
                .args(format_args!("quiet"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Error)
                .args(format_args!("loud"))
                .build(),
        );
        pane.drain();
        assert_eq!(pane.lines().collect::<Vec<_>>(), vec!["[ERROR] loud"]);
    }
}
