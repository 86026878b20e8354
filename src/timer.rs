/// Result of advancing the exam clocks by one second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Clocks are stopped (not started, paused, or already expired)
    Frozen,
    /// Both clocks advanced; `question_expired` is set once the per-question budget is used up
    Running { question_expired: bool },
    /// The total budget just ran out. Reported exactly once.
    TotalExpired,
}

/// Two countdowns driven by an external one-second tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamTimer {
    per_question_seconds: u64,
    total_seconds: u64,
    per_question_remaining: u64,
    total_remaining: u64,
    running: bool,
    paused: bool,
}

impl ExamTimer {
    pub fn new(total_seconds: u64, per_question_seconds: u64) -> Self {
        Self {
            per_question_seconds,
            total_seconds,
            per_question_remaining: per_question_seconds,
            total_remaining: total_seconds,
            running: false,
            paused: false,
        }
    }

    pub fn start(&mut self) {
        self.per_question_remaining = self.per_question_seconds;
        self.total_remaining = self.total_seconds;
        self.running = true;
        self.paused = false;
    }

    pub fn pause(&mut self) {
        if self.running {
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn tick(&mut self) -> TimerTick {
        if !self.running || self.paused {
            return TimerTick::Frozen;
        }

        // A zero budget is already spent when the clocks start
        if self.total_remaining > 0 {
            self.per_question_remaining = self.per_question_remaining.saturating_sub(1);
            self.total_remaining -= 1;
        }

        if self.total_remaining == 0 {
            self.running = false;
            return TimerTick::TotalExpired;
        }

        TimerTick::Running {
            question_expired: self.per_question_remaining == 0,
        }
    }

    pub fn reset_question_timer(&mut self) {
        self.per_question_remaining = self.per_question_seconds;
    }

    /// Stop both clocks without touching the remaining values
    pub fn stop(&mut self) {
        self.running = false;
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn per_question_remaining(&self) -> u64 {
        self.per_question_remaining
    }

    pub fn total_remaining(&self) -> u64 {
        self.total_remaining
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.total_seconds - self.total_remaining
    }
}

/// Format seconds as `MM:SS`; minutes keep growing past 99
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_timer_is_frozen() {
        let mut timer = ExamTimer::new(600, 180);
        assert_eq!(timer.tick(), TimerTick::Frozen);
        assert_eq!(timer.total_remaining(), 600);
        assert_eq!(timer.per_question_remaining(), 180);
        assert!(!timer.is_paused());
    }

    #[test]
    fn test_five_ticks_after_start() {
        let mut timer = ExamTimer::new(600, 180);
        timer.start();
        for _ in 0..5 {
            timer.tick();
        }
        assert_eq!(timer.per_question_remaining(), 175);
        assert_eq!(timer.total_remaining(), 595);
        assert_eq!(timer.elapsed_seconds(), 5);

        timer.reset_question_timer();
        assert_eq!(timer.per_question_remaining(), 180);
        assert_eq!(timer.total_remaining(), 595);
    }

    #[test]
    fn test_pause_freezes_both_clocks() {
        let mut timer = ExamTimer::new(600, 180);
        timer.start();
        timer.pause();
        assert!(timer.is_paused());
        for _ in 0..10 {
            assert_eq!(timer.tick(), TimerTick::Frozen);
        }
        assert_eq!(timer.per_question_remaining(), 180);
        assert_eq!(timer.total_remaining(), 600);

        timer.resume();
        timer.tick();
        assert_eq!(timer.per_question_remaining(), 179);
        assert_eq!(timer.total_remaining(), 599);
    }

    #[test]
    fn test_question_expiry_is_informational() {
        let mut timer = ExamTimer::new(10, 2);
        timer.start();
        assert_eq!(
            timer.tick(),
            TimerTick::Running {
                question_expired: false
            }
        );
        assert_eq!(
            timer.tick(),
            TimerTick::Running {
                question_expired: true
            }
        );
        assert_eq!(
            timer.tick(),
            TimerTick::Running {
                question_expired: true
            }
        );
        assert_eq!(timer.per_question_remaining(), 0);
        assert_eq!(timer.total_remaining(), 7);
    }

    #[test]
    fn test_total_expiry_reported_once() {
        let mut timer = ExamTimer::new(3, 180);
        timer.start();
        timer.tick();
        timer.tick();
        assert_eq!(timer.tick(), TimerTick::TotalExpired);
        assert_eq!(timer.tick(), TimerTick::Frozen);
        assert_eq!(timer.total_remaining(), 0);
        assert_eq!(timer.elapsed_seconds(), 3);
    }

    #[test]
    fn test_zero_budget_expires_on_first_tick() {
        let mut timer = ExamTimer::new(0, 0);
        assert_eq!(timer.tick(), TimerTick::Frozen);

        timer.start();
        assert_eq!(timer.tick(), TimerTick::TotalExpired);
        assert_eq!(timer.tick(), TimerTick::Frozen);
        assert_eq!(timer.elapsed_seconds(), 0);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(600), "10:00");
        assert_eq!(format_clock(6000), "100:00");
    }
}
