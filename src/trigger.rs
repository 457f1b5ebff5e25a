//! Component G — trigger dispatch.
//!
//! A TRIG counter (spec §3) publishes a record to every listener whose
//! `report_type` matches the event that just fired, rather than
//! accumulating a scalar. Listeners buffer records and flush through the
//! external output writer (spec §6) once full.

use crate::error::{CountError, Result};
use crate::format::format_g;
use crate::geometry::Vector3;
use crate::ids::RegionId;

/// The kind of event a listener wants reported.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReportKind {
    Contents,
    Rxns,
    FrontHits,
    BackHits,
    FrontCrossings,
    BackCrossings,
    AllHits,
    AllCrossings,
}

/// A listener's full report-type request: a base kind, optionally OR'd
/// with the TRIGGER and ENCLOSED modifiers (spec §4.G).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ReportType {
    pub kind: ReportKind,
    pub trigger: bool,
    pub enclosed: bool,
}

impl ReportType {
    pub fn new(kind: ReportKind) -> Self {
        ReportType { kind, trigger: false, enclosed: false }
    }

    pub fn with_trigger(mut self) -> Self {
        self.trigger = true;
        self
    }

    pub fn with_enclosed(mut self) -> Self {
        self.enclosed = true;
        self
    }
}

/// What actually fired, as seen by `fire_count_event` (spec §4.G step 2).
/// Distinct direction variants let `AllHits`/`AllCrossings` listeners flip
/// the sign of `n` for the BACK direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FiredEvent {
    Contents,
    Rxns,
    FrontHits,
    BackHits,
    FrontCrossings,
    BackCrossings,
}

impl FiredEvent {
    fn matches(self, kind: ReportKind) -> Option<i64> {
        use FiredEvent::*;
        use ReportKind as K;
        match (self, kind) {
            (Contents, K::Contents) => Some(1),
            (Rxns, K::Rxns) => Some(1),
            (FrontHits, K::FrontHits) => Some(1),
            (BackHits, K::BackHits) => Some(1),
            (FrontCrossings, K::FrontCrossings) => Some(1),
            (BackCrossings, K::BackCrossings) => Some(1),
            (FrontHits, K::AllHits) => Some(1),
            (BackHits, K::AllHits) => Some(-1),
            (FrontCrossings, K::AllCrossings) => Some(1),
            (BackCrossings, K::AllCrossings) => Some(-1),
            _ => None,
        }
    }
}

/// One line's worth of trigger output (spec §6).
#[derive(Clone, Debug)]
pub struct TriggerRecord {
    pub t_iteration: f64,
    pub event_time: Option<f64>,
    pub loc: Vector3,
    /// Present for HIT and CONTENTS lines, absent for REACTION lines.
    pub orient: Option<i8>,
    /// Present only for CONTENTS lines.
    pub count: Option<i64>,
    pub name: String,
}

impl TriggerRecord {
    /// Render the ASCII, space-separated line described in spec §6.
    pub fn format_line(&self) -> String {
        let mut out = format_g(self.t_iteration, 15);
        out.push(' ');
        if let Some(t) = self.event_time {
            out.push('[');
            out.push_str(&format_g(t, 12));
            out.push_str(" ]");
        }
        out.push_str(&format_g(self.loc.x, 9));
        out.push(' ');
        out.push_str(&format_g(self.loc.y, 9));
        out.push(' ');
        out.push_str(&format_g(self.loc.z, 9));
        if let Some(orient) = self.orient {
            out.push(' ');
            out.push_str(&orient.to_string());
        }
        if let Some(count) = self.count {
            out.push(' ');
            out.push_str(&count.to_string());
        }
        out.push(' ');
        out.push_str(&self.name);
        out
    }
}

/// A single listener request attached to a TRIG counter.
#[derive(Clone, Debug)]
pub struct TriggerListener {
    pub report_type: ReportType,
    pub exact_time_flag: bool,
    pub name: String,
    pub file_id: usize,
    pub buffer: Vec<TriggerRecord>,
    pub buffer_capacity: usize,
}

impl TriggerListener {
    pub fn new(report_type: ReportType, name: impl Into<String>, file_id: usize, buffer_capacity: usize, exact_time_flag: bool) -> Self {
        TriggerListener {
            report_type,
            exact_time_flag,
            name: name.into(),
            file_id,
            buffer: Vec::new(),
            buffer_capacity,
        }
    }
}

/// External output collaborator (spec §6): owns buffering/batching and
/// byte-exact formatting beyond building the line itself.
pub trait OutputWriter {
    fn append_trigger(&mut self, file_id: usize, line: &str) -> Result<()>;
    /// Returns the number of flush errors encountered, matching the
    /// original's `emergency_output()` convention.
    fn flush_all(&mut self) -> usize;
    /// Checkpoint-resume support (spec §6): truncate each reaction-output
    /// file at the first line whose leading timestamp is >= `resume_time`.
    fn truncate_from(&mut self, resume_time: f64) -> Result<()>;
}

/// `fire_count_event` (spec §4.G): stamp the counter's `loc`, build the
/// record for every listener whose `report_type` matches `what`, and flush
/// any listener whose buffer reaches capacity.
pub fn fire_count_event<W: OutputWriter>(
    listeners: &mut [TriggerListener],
    writer: &mut W,
    what: FiredEvent,
    n: i64,
    loc: Vector3,
    t_iteration: f64,
    event_time: f64,
    orient: Option<i8>,
    count: Option<i64>,
) -> Result<()> {
    for listener in listeners.iter_mut() {
        let Some(sign) = what.matches(listener.report_type.kind) else { continue };
        let record = TriggerRecord {
            t_iteration,
            event_time: if listener.exact_time_flag { Some(event_time) } else { None },
            loc,
            orient,
            count: count.map(|c| c * sign),
            name: listener.name.clone(),
        };
        let emitted_n = n * sign;
        let _ = emitted_n; // n is carried in `count` for CONTENTS records; HIT/REACTION records carry none.
        listener.buffer.push(record);

        if listener.buffer.len() >= listener.buffer_capacity {
            let lines: Vec<String> = listener.buffer.drain(..).map(|r| r.format_line()).collect();
            for line in lines {
                if writer.append_trigger(listener.file_id, &line).is_err() {
                    return Err(CountError::BufferOverflow { region: RegionId(listener.file_id) });
                }
            }
        }
    }
    Ok(())
}
