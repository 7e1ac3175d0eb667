pub mod admins;
pub mod check_in_logs;
pub mod member_images;
pub mod members;
pub mod membership_packages;

pub use admins::{AdminRepo, CreateAdmin, UpdateAdminProfile};
pub use check_in_logs::{CheckInLogFilter, CheckInLogRepo, NewCheckInLog};
pub use member_images::{CreateMemberImage, MemberImageRepo};
pub use members::{CreateMemberData, MemberFilter, MemberRepo, MembershipActivity};
pub use membership_packages::MembershipPackageRepo;
