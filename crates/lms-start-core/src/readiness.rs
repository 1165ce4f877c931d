//! Waiting for a freshly launched server: fixed delay or HTTP polling.

use anyhow::{Context, Result};
use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Answers "is something serving `url` yet?".
pub trait Probe {
    fn is_ready(&mut self, url: &str) -> bool;
}

/// Probes with a blocking reqwest client. Any HTTP response counts as ready;
/// only connection errors and timeouts do not.
pub struct HttpProbe {
    client: reqwest::blocking::Client,
}

impl HttpProbe {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

impl Probe for HttpProbe {
    fn is_ready(&mut self, url: &str) -> bool {
        self.client.get(url).send().is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wait {
    /// Sleep, then assume the service is up.
    Fixed(Duration),
    /// Probe `url` every `interval` until it answers or `timeout` passes.
    Poll {
        url: String,
        interval: Duration,
        timeout: Duration,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Fixed delay elapsed; nothing was checked.
    Assumed,
    Ready { attempts: u32 },
    TimedOut { attempts: u32 },
}

pub fn wait(strategy: &Wait, clock: &mut dyn Clock, probe: &mut dyn Probe) -> Readiness {
    match strategy {
        Wait::Fixed(delay) => {
            clock.sleep(*delay);
            Readiness::Assumed
        }
        Wait::Poll {
            url,
            interval,
            timeout,
        } => poll(url, *interval, *timeout, clock, probe),
    }
}

fn poll(
    url: &str,
    interval: Duration,
    timeout: Duration,
    clock: &mut dyn Clock,
    probe: &mut dyn Probe,
) -> Readiness {
    // `None` when the timeout is too large to represent: poll without a deadline.
    let deadline = clock.now().checked_add(timeout);
    let mut attempts: u32 = 0;
    loop {
        attempts = attempts.saturating_add(1);
        if probe.is_ready(url) {
            return Readiness::Ready { attempts };
        }
        let pause = match deadline {
            Some(deadline) => {
                let now = clock.now();
                if now >= deadline {
                    return Readiness::TimedOut { attempts };
                }
                interval.min(deadline - now)
            }
            None => interval,
        };
        clock.sleep(pause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeClock {
        start: Instant,
        elapsed: Duration,
        sleeps: Vec<Duration>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                start: Instant::now(),
                elapsed: Duration::ZERO,
                sleeps: Vec::new(),
            }
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.start + self.elapsed
        }

        fn sleep(&mut self, duration: Duration) {
            self.elapsed += duration;
            self.sleeps.push(duration);
        }
    }

    /// Ready after `after` failed probes; `None` = never.
    struct CountingProbe {
        after: Option<u32>,
        calls: u32,
        urls: Vec<String>,
    }

    impl Probe for CountingProbe {
        fn is_ready(&mut self, url: &str) -> bool {
            self.calls += 1;
            self.urls.push(url.to_string());
            matches!(self.after, Some(n) if self.calls > n)
        }
    }

    fn poll_wait(timeout_secs: u64) -> Wait {
        Wait::Poll {
            url: "http://localhost:3001/health".to_string(),
            interval: Duration::from_millis(500),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    #[test]
    fn fixed_sleeps_once_and_never_probes() {
        let mut clock = FakeClock::new();
        let mut probe = CountingProbe { after: Some(0), calls: 0, urls: vec![] };
        let result = wait(&Wait::Fixed(Duration::from_secs(8)), &mut clock, &mut probe);
        assert_eq!(result, Readiness::Assumed);
        assert_eq!(clock.sleeps, vec![Duration::from_secs(8)]);
        assert_eq!(probe.calls, 0);
    }

    #[test]
    fn poll_returns_on_first_answer() {
        let mut clock = FakeClock::new();
        let mut probe = CountingProbe { after: Some(3), calls: 0, urls: vec![] };
        let result = wait(&poll_wait(60), &mut clock, &mut probe);
        assert_eq!(result, Readiness::Ready { attempts: 4 });
        assert_eq!(clock.elapsed, Duration::from_millis(1500));
        assert!(probe.urls.iter().all(|u| u == "http://localhost:3001/health"));
    }

    #[test]
    fn poll_gives_up_at_timeout() {
        let mut clock = FakeClock::new();
        let mut probe = CountingProbe { after: None, calls: 0, urls: vec![] };
        let result = wait(&poll_wait(2), &mut clock, &mut probe);
        // Probes at 0, 0.5, 1.0, 1.5 and 2.0 seconds.
        assert_eq!(result, Readiness::TimedOut { attempts: 5 });
        assert_eq!(clock.elapsed, Duration::from_secs(2));
    }

    #[test]
    fn poll_never_sleeps_past_deadline() {
        let mut clock = FakeClock::new();
        let mut probe = CountingProbe { after: None, calls: 0, urls: vec![] };
        let strategy = Wait::Poll {
            url: "http://localhost:5173".to_string(),
            interval: Duration::from_secs(3),
            timeout: Duration::from_secs(4),
        };
        let result = wait(&strategy, &mut clock, &mut probe);
        assert_eq!(result, Readiness::TimedOut { attempts: 3 });
        assert_eq!(clock.sleeps, vec![Duration::from_secs(3), Duration::from_secs(1)]);
    }

    #[test]
    fn unrepresentable_timeout_polls_until_ready() {
        let mut clock = FakeClock::new();
        let mut probe = CountingProbe { after: Some(2), calls: 0, urls: vec![] };
        let strategy = Wait::Poll {
            url: "http://localhost:3001/health".to_string(),
            interval: Duration::from_millis(500),
            timeout: Duration::from_secs(u64::MAX),
        };
        let result = wait(&strategy, &mut clock, &mut probe);
        assert_eq!(result, Readiness::Ready { attempts: 3 });
        assert_eq!(clock.elapsed, Duration::from_secs(1));
    }

    #[test]
    fn http_probe_reports_closed_port_as_not_ready() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let mut probe = HttpProbe::new().unwrap();
        assert!(!probe.is_ready(&format!("http://127.0.0.1:{}/health", port)));
    }
}
