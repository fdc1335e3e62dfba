use std::io;
use std::thread::{self, JoinHandle};

/// Spawns the long-lived worker threads (host driver, notifications, status
/// display).
pub trait Scheduler {
    fn spawn<F>(&self, name: &str, f: F) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static;
}

pub struct ThreadScheduler;

impl ThreadScheduler {
    pub fn new() -> Self {
        ThreadScheduler
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ThreadScheduler {
    fn spawn<F>(&self, name: &str, f: F) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        thread::Builder::new().name(name.to_string()).spawn(f)
    }
}
