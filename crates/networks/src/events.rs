use bevy::prelude::*;

use crate::connection::Connection;
use crate::network_manager::RecomputeReport;
use crate::point::Point;
use crate::propagation::TruncationReason;

/// A published cell value changed. Sent once per changed cell, in ascending
/// point order within a connection.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct PointValueChanged {
    pub connection: Connection,
    pub point: Point,
    pub value: f32,
    /// `None` if the cell had no value before this publish.
    pub previous: Option<f32>,
    pub tick: u64,
}

/// A recompute hit its step or iteration bound and published a partial
/// result.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct PropagationTruncated {
    pub connection: Connection,
    pub reason: TruncationReason,
    /// Cells reached before the bound stopped propagation.
    pub reached: usize,
    pub tick: u64,
}

pub(crate) fn forward_report(
    report: RecomputeReport,
    changed: &mut EventWriter<PointValueChanged>,
    truncated: &mut EventWriter<PropagationTruncated>,
) {
    if let Some(truncation) = report.truncation {
        truncated.send(PropagationTruncated {
            connection: report.connection.clone(),
            reason: truncation.reason,
            reached: truncation.reached,
            tick: report.tick,
        });
    }
    for change in report.changes {
        changed.send(PointValueChanged {
            connection: report.connection.clone(),
            point: change.point,
            value: change.value,
            previous: change.previous,
            tick: report.tick,
        });
    }
}
