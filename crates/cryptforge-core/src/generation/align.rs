//! Connector-to-connector alignment of unplaced modules.

use cryptforge_logic::math::{Pose, Yaw};
use thiserror::Error;

use crate::components::{ConnectorPoint, ModuleInstance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AlignError {
    #[error("placed connector faces straight up or down")]
    VerticalPlacedConnector,
    #[error("candidate connector faces straight up or down")]
    VerticalCandidateConnector,
    #[error("candidate has no connector {0}")]
    MissingConnector(usize),
}

/// Move `candidate` so its connector `to_index` sits on `from`, facing it.
///
/// The candidate is turned about its pivot until the flattened forward of
/// `to` points opposite the flattened forward of `from`, then translated so
/// the two connectors coincide. Only the candidate's pose changes; nothing is
/// marked connected.
pub fn align_to(
    from: &ConnectorPoint,
    candidate: &mut ModuleInstance,
    to_index: usize,
) -> Result<(), AlignError> {
    let to = candidate
        .connectors
        .get(to_index)
        .ok_or(AlignError::MissingConnector(to_index))?;

    let target = Yaw::from_direction(-from.forward).ok_or(AlignError::VerticalPlacedConnector)?;
    let current = Yaw::from_direction(to.forward).ok_or(AlignError::VerticalCandidateConnector)?;

    let rotation = target
        .then_after(current.inverse())
        .then_after(candidate.pose.rotation);
    let position = from.position - rotation.rotate(to.local_position);

    candidate.set_pose(Pose::new(position, rotation));
    Ok(())
}
