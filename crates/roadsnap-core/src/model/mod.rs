pub mod epic;
pub mod issue;
pub mod status;

pub use epic::EpicSnapshot;
pub use issue::{Issue, browse_link};
pub use status::{Bucket, ParseEnumError, PlanningStatus, Quarter, StatusCategory};
