//! Routes an operation to the chain builder

use super::message::Operation;
use crate::chains::{process, ActivityWindow, BuildMode, ChainsResult};

/// Execute one operation. Pure: same operation in, same result out.
pub fn dispatch(operation: Operation) -> ChainsResult {
    match operation {
        Operation::Build {
            relationships,
            follow_up_period,
            now,
        } => process(
            relationships,
            ActivityWindow::new(follow_up_period, now),
            BuildMode::Full,
        ),
        Operation::Count {
            relationships,
            follow_up_period,
            now,
        } => process(
            relationships,
            ActivityWindow::new(follow_up_period, now),
            BuildMode::CountOnly,
        ),
    }
}
