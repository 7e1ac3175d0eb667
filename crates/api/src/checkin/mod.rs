pub mod admission;
pub mod recorder;
pub mod store;

pub use admission::{evaluate, Admission, DenialReason};
pub use recorder::{
    CheckInOutcome, CheckInQuery, CheckInRecorder, CheckOutOutcome, FrontDeskMember, MemberBrief,
    VisitDuration,
};
pub use store::{CheckInLogStore, MemberStore, StoreResult};
