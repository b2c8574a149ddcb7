//! Timer and idle queues driven by a virtual clock
//!
//! Nothing here sleeps: the clock only moves when the event loop asks for
//! the next timer, which makes timer-driven code deterministic under test.

use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone)]
struct Pending {
    token: String,
    script: String,
}

/// Where a pending script is queued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Queue {
    Timer,
    Idle,
}

impl Queue {
    pub(super) fn as_str(self) -> &'static str {
        match self {
            Self::Timer => "timer",
            Self::Idle => "idle",
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct Scheduler {
    now: u64,
    next_token: u64,
    /// Keyed by (due time, insertion sequence) so equal deadlines keep FIFO order
    timers: BTreeMap<(u64, u64), Pending>,
    idle: VecDeque<Pending>,
}

impl Scheduler {
    pub(super) fn now(&self) -> u64 {
        self.now
    }

    /// Move the clock forward without running anything
    pub(super) fn sleep(&mut self, ms: u64) {
        self.now = self.now.saturating_add(ms);
    }

    fn token(&mut self) -> (u64, String) {
        let seq = self.next_token;
        self.next_token += 1;
        (seq, format!("after#{seq}"))
    }

    pub(super) fn schedule(&mut self, delay_ms: u64, script: String) -> String {
        let (seq, token) = self.token();
        let due = self.now.saturating_add(delay_ms);
        self.timers.insert(
            (due, seq),
            Pending {
                token: token.clone(),
                script,
            },
        );
        token
    }

    pub(super) fn schedule_idle(&mut self, script: String) -> String {
        let (_, token) = self.token();
        self.idle.push_back(Pending {
            token: token.clone(),
            script,
        });
        token
    }

    /// Cancel by token, or failing that by script text; unknown ids are ignored
    pub(super) fn cancel(&mut self, id_or_script: &str) -> bool {
        self.remove_first(|p| p.token == id_or_script) || self.remove_first(|p| p.script == id_or_script)
    }

    fn remove_first(&mut self, matches: impl Fn(&Pending) -> bool) -> bool {
        if let Some(key) = self
            .timers
            .iter()
            .find_map(|(key, p)| matches(p).then_some(*key))
        {
            self.timers.remove(&key);
            return true;
        }
        if let Some(pos) = self.idle.iter().position(|p| matches(p)) {
            self.idle.remove(pos);
            return true;
        }
        false
    }

    /// Tokens of every pending script, idle entries first
    pub(super) fn tokens(&self) -> Vec<String> {
        self.idle
            .iter()
            .chain(self.timers.values())
            .map(|p| p.token.clone())
            .collect()
    }

    pub(super) fn describe(&self, token: &str) -> Option<(String, Queue)> {
        if let Some(p) = self.idle.iter().find(|p| p.token == token) {
            return Some((p.script.clone(), Queue::Idle));
        }
        self.timers
            .values()
            .find(|p| p.token == token)
            .map(|p| (p.script.clone(), Queue::Timer))
    }

    pub(super) fn len(&self) -> usize {
        self.timers.len() + self.idle.len()
    }

    pub(super) fn next_idle(&mut self) -> Option<String> {
        self.idle.pop_front().map(|p| p.script)
    }

    /// Next script to run whose deadline is at or before `deadline`; idle
    /// work always comes first. Advances the clock to the timer's due time.
    pub(super) fn next_due_by(&mut self, deadline: u64) -> Option<String> {
        if let Some(script) = self.next_idle() {
            return Some(script);
        }
        let (&key, _) = self.timers.iter().next()?;
        if key.0 > deadline {
            return None;
        }
        self.now = self.now.max(key.0);
        self.timers.remove(&key).map(|p| p.script)
    }

    /// Next script to run, jumping the clock to the earliest timer if needed
    pub(super) fn next_any(&mut self) -> Option<String> {
        self.next_due_by(u64::MAX)
    }

    pub(super) fn set_now(&mut self, now: u64) {
        self.now = self.now.max(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timers_run_in_deadline_order() {
        let mut s = Scheduler::default();
        s.schedule(50, "late".into());
        s.schedule(10, "early".into());
        s.schedule(10, "early2".into());

        assert_eq!(s.next_any().as_deref(), Some("early"));
        assert_eq!(s.now(), 10);
        assert_eq!(s.next_any().as_deref(), Some("early2"));
        assert_eq!(s.next_any().as_deref(), Some("late"));
        assert_eq!(s.now(), 50);
        assert!(s.next_any().is_none());
    }

    #[test]
    fn test_idle_before_timers() {
        let mut s = Scheduler::default();
        s.schedule(0, "timer".into());
        s.schedule_idle("idle".into());
        assert_eq!(s.next_due_by(0).as_deref(), Some("idle"));
        assert_eq!(s.next_due_by(0).as_deref(), Some("timer"));
    }

    #[test]
    fn test_deadline_is_respected() {
        let mut s = Scheduler::default();
        s.schedule(100, "later".into());
        assert!(s.next_due_by(99).is_none());
        assert_eq!(s.now(), 0);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_cancel_by_token_and_script() {
        let mut s = Scheduler::default();
        let a = s.schedule(10, "a".into());
        s.schedule_idle("b".into());

        assert!(s.cancel(&a));
        assert!(!s.cancel(&a));
        assert!(s.cancel("b"));
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn test_tokens_are_unique() {
        let mut s = Scheduler::default();
        let a = s.schedule(1, "x".into());
        let b = s.schedule_idle("x".into());
        assert_ne!(a, b);
        assert_eq!(s.describe(&b), Some(("x".to_string(), Queue::Idle)));
        assert_eq!(s.tokens().len(), 2);
    }
}
