mod claim;
mod margin;
mod plan;
mod position;
mod role;

pub use claim::Claims;
pub use margin::MarginOpKind;
pub use plan::Plan;
pub use position::{Direction, OptionType, PositionStatus};
pub use role::Role;
