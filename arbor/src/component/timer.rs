//! Per-component timers advanced once per frame

use serde::{Deserialize, Serialize};

/// Handle returned when a timer is added
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(pub u32);

/// How many times a timer fires before it is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerRepeat {
    /// Until removed
    Forever,
    /// A fixed number of times
    Times(u32),
}

/// Passed to `on_timer` each time a timer fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    /// Timer that fired
    pub id: TimerId,
    /// How many times it has fired, this one included
    pub count: u32,
    /// Repeat policy it was created with
    pub repeat: TimerRepeat,
    /// True on the last firing; the timer is gone afterwards
    pub done: bool,
}

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    interval: f32,
    elapsed: f32,
    count: u32,
    repeat: TimerRepeat,
}

/// Timers owned by one component
#[derive(Debug, Default, Clone)]
pub struct Timers {
    next_id: u32,
    timers: Vec<Timer>,
}

impl Timers {
    /// Add a timer firing every `interval` seconds
    pub fn add(&mut self, interval: f32, repeat: TimerRepeat) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            interval: interval.max(0.0),
            elapsed: 0.0,
            count: 0,
            repeat,
        });
        id
    }

    /// Add a timer firing once after `delay` seconds
    pub fn add_once(&mut self, delay: f32) -> TimerId {
        self.add(delay, TimerRepeat::Times(1))
    }

    /// Remove a timer; returns false if it was not found
    pub fn remove(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);
        self.timers.len() != before
    }

    /// Remove every timer
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Whether no timer is pending
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Advance every timer by `dt` and return the ones that fired
    ///
    /// A timer fires at most once per call; leftover time carries over to the
    /// next frame. Finished timers are removed before returning.
    pub fn advance(&mut self, dt: f32) -> Vec<TimerTick> {
        let mut ticks = Vec::new();

        for timer in &mut self.timers {
            timer.elapsed += dt;
            if timer.elapsed < timer.interval {
                continue;
            }

            timer.elapsed -= timer.interval;
            timer.count += 1;
            let done = matches!(timer.repeat, TimerRepeat::Times(n) if timer.count >= n);
            ticks.push(TimerTick {
                id: timer.id,
                count: timer.count,
                repeat: timer.repeat,
                done,
            });
        }

        self.timers
            .retain(|timer| !matches!(timer.repeat, TimerRepeat::Times(n) if timer.count >= n));
        ticks
    }
}
