//! Timestamped parameter automation.

/*
Automation Lanes
================

A lane is a parameter value defined as a function of time by a short list of
events. Times are in seconds on the render clock. The lane is evaluated per
sample by the render thread, so anything scheduled on it is sample-accurate.

Events
------

  SetValue(v, t)          jump to v at t
  LinearRamp(v, t)        straight line from the previous event to v, ending at t
  ExponentialRamp(v, t)   geometric curve from the previous event to v, ending at t
  SetTarget(v, t, tau)    from t on, approach v exponentially with time constant tau

Ramps are anchored at the END time; they start wherever the previous event
left the value. That makes "ramp from here" trivial: set the current value,
then add a ramp.

    value
      0.6 |      /\
          |     /  `-._
          |    /       `--.___
    0.001 |___/               `-----
          +----+-----+-------------->
          t0   t0+A  t0+A+D        t

Evaluating at t
---------------

  1. Find the first event whose time is after t.
  2. If it is a ramp, interpolate between the state at the end of the events
     before it and the ramp's target.
  3. Otherwise the value is whatever the last started event says. For a
     SetTarget that is

         v(t) = target + (v0 - target) * exp(-(t - t0) / tau)

     where v0 is the lane's value just before the target started.

An exponential ramp cannot cross or touch zero. If either end is zero or the
ends have opposite signs, the value holds at the start until the ramp ends.

Cancel and prune
----------------

cancel_scheduled_values(t) drops every event at or after t. Combined with
value_at(t) this gives "freeze where you are right now", which is how a
release starts from the live level.

prune(t) folds events that can no longer affect values at or after t into a
single SetValue, keeping the list short for lanes that see frequent updates.
*/

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutomationEvent {
    SetValue { value: f32, time: f64 },
    LinearRamp { value: f32, time: f64 },
    ExponentialRamp { value: f32, time: f64 },
    SetTarget { target: f32, time: f64, time_constant: f64 },
}

impl AutomationEvent {
    #[inline]
    pub fn time(&self) -> f64 {
        match *self {
            AutomationEvent::SetValue { time, .. }
            | AutomationEvent::LinearRamp { time, .. }
            | AutomationEvent::ExponentialRamp { time, .. }
            | AutomationEvent::SetTarget { time, .. } => time,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AutomationLane {
    default_value: f32,
    events: Vec<AutomationEvent>,
}

impl AutomationLane {
    pub fn new(default_value: f32) -> Self {
        Self {
            default_value,
            events: Vec::with_capacity(8),
        }
    }

    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    pub fn set_value_at(&mut self, value: f32, time: f64) {
        self.insert(AutomationEvent::SetValue { value, time });
    }

    pub fn linear_ramp_to(&mut self, value: f32, end_time: f64) {
        self.insert(AutomationEvent::LinearRamp {
            value,
            time: end_time,
        });
    }

    pub fn exponential_ramp_to(&mut self, value: f32, end_time: f64) {
        self.insert(AutomationEvent::ExponentialRamp {
            value,
            time: end_time,
        });
    }

    pub fn set_target_at(&mut self, target: f32, start_time: f64, time_constant: f64) {
        self.insert(AutomationEvent::SetTarget {
            target,
            time: start_time,
            time_constant: time_constant.max(0.0),
        });
    }

    /// Drop every event scheduled at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    /// Freeze the lane at its value at `time`, discarding anything later.
    ///
    /// Returns the held value.
    pub fn cancel_and_hold(&mut self, time: f64) -> f32 {
        let held = self.value_at(time);
        self.cancel_scheduled_values(time);
        self.set_value_at(held, time);
        held
    }

    pub fn value_at(&self, time: f64) -> f32 {
        value_in(&self.events, self.default_value, time)
    }

    /// Fill `out` with values at `start`, `start + dt`, ...
    pub fn fill(&self, out: &mut [f32], start: f64, dt: f64) {
        if self.is_settled(start) {
            out.fill(self.value_at(start));
            return;
        }
        for (i, value) in out.iter_mut().enumerate() {
            *value = self.value_at(start + i as f64 * dt);
        }
    }

    /// True once no event can change the value after `time`.
    pub fn is_settled(&self, time: f64) -> bool {
        match self.events.last() {
            None => true,
            Some(AutomationEvent::SetTarget { .. }) => false,
            Some(last) => last.time() <= time,
        }
    }

    /// Collapse events that are fully in the past relative to `time`.
    pub fn prune(&mut self, time: f64) {
        let started = self.events.partition_point(|e| e.time() <= time);
        if started == 0 {
            return;
        }
        let last = self.events[started - 1];
        match last {
            AutomationEvent::SetTarget { time: start, .. } => {
                if started == 1 {
                    return;
                }
                let v0 = value_in(&self.events[..started - 1], self.default_value, start);
                self.events.drain(..started);
                self.events.insert(0, last);
                self.events
                    .insert(0, AutomationEvent::SetValue { value: v0, time: start });
            }
            AutomationEvent::SetValue { .. } if started == 1 => {}
            AutomationEvent::SetValue { value, time: at }
            | AutomationEvent::LinearRamp { value, time: at }
            | AutomationEvent::ExponentialRamp { value, time: at } => {
                self.events.drain(..started);
                self.events
                    .insert(0, AutomationEvent::SetValue { value, time: at });
            }
        }
    }

    fn insert(&mut self, event: AutomationEvent) {
        let at = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(at, event);
    }
}

/// Value and time at which `events` leave the lane.
fn end_state(events: &[AutomationEvent], default_value: f32) -> (f32, f64) {
    match events.last() {
        None => (default_value, 0.0),
        Some(&AutomationEvent::SetTarget { time, .. }) => {
            (value_in(events, default_value, time), time)
        }
        Some(&AutomationEvent::SetValue { value, time })
        | Some(&AutomationEvent::LinearRamp { value, time })
        | Some(&AutomationEvent::ExponentialRamp { value, time }) => (value, time),
    }
}

fn value_in(events: &[AutomationEvent], default_value: f32, t: f64) -> f32 {
    let next = events.partition_point(|e| e.time() <= t);

    if let Some(&pending) = events.get(next) {
        match pending {
            AutomationEvent::LinearRamp { value: v1, time: t1 } => {
                let (v0, t0) = end_state(&events[..next], default_value);
                if t1 <= t0 {
                    return v0;
                }
                let x = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0) as f32;
                return v0 + (v1 - v0) * x;
            }
            AutomationEvent::ExponentialRamp { value: v1, time: t1 } => {
                let (v0, t0) = end_state(&events[..next], default_value);
                if t1 <= t0 || v0 == 0.0 || v1 == 0.0 || (v0 < 0.0) != (v1 < 0.0) {
                    return v0;
                }
                let x = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0) as f32;
                return v0 * (v1 / v0).powf(x);
            }
            _ => {}
        }
    }

    if next == 0 {
        return default_value;
    }

    match events[next - 1] {
        AutomationEvent::SetTarget {
            target,
            time,
            time_constant,
        } => {
            let v0 = value_in(&events[..next - 1], default_value, time);
            if time_constant <= 0.0 {
                return target;
            }
            let decay = (-(t - time) / time_constant).exp() as f32;
            target + (v0 - target) * decay
        }
        AutomationEvent::SetValue { value, .. }
        | AutomationEvent::LinearRamp { value, .. }
        | AutomationEvent::ExponentialRamp { value, .. } => value,
    }
}
