use crate::config::PublishConfig;

/// 送信レート (Hz) から送信間隔（秒）。0 以下は無制限 (0.0)
pub fn interval_from_rate(rate_hz: f64) -> f64 {
    if rate_hz > 0.0 {
        1.0 / rate_hz
    } else {
        0.0
    }
}

/// now >= next_allowed なら送信し、次の許可時刻を now + interval にする
///
/// interval が 0 以下なら毎回送信
pub fn should_tick(now: f64, interval: f64, next_allowed: f64) -> (bool, f64) {
    if interval > 0.0 && now < next_allowed {
        return (false, next_allowed);
    }
    (true, now + interval.max(0.0))
}

/// 送信レート制御
///
/// 間引きカウンタ (N 回に 1 回だけ候補にする) と時間間隔の両方を満たしたときだけ送信する
#[derive(Debug, Clone)]
pub struct PublishScheduler {
    interval: f64,
    next_allowed: f64,
    decimation: u32,
    counter: u32,
}

impl PublishScheduler {
    pub fn new(interval: f64, decimation: u32) -> Self {
        Self {
            interval,
            next_allowed: 0.0,
            decimation: decimation.max(1),
            counter: 0,
        }
    }

    pub fn from_rate(rate_hz: f64) -> Self {
        Self::new(interval_from_rate(rate_hz), 1)
    }

    pub fn from_config(config: &PublishConfig) -> Self {
        Self::new(interval_from_rate(config.rate_hz), config.decimation)
    }

    /// このフレームで送信するか
    pub fn poll(&mut self, now: f64) -> bool {
        self.counter += 1;
        if self.counter % self.decimation != 0 {
            return false;
        }
        self.counter = 0;

        let (fire, next) = should_tick(now, self.interval, self.next_allowed);
        self.next_allowed = next;
        fire
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn next_allowed(&self) -> f64 {
        self.next_allowed
    }

    pub fn reset(&mut self) {
        self.next_allowed = 0.0;
        self.counter = 0;
    }
}
