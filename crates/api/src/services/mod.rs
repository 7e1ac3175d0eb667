pub mod admin_service;
pub mod expiration_service;
pub mod member_service;
pub mod notifier;

pub use admin_service::AdminService;
pub use expiration_service::{spawn_expiration_sweeper, ExpirationSweeper, SweeperHandle};
pub use member_service::MemberService;
pub use notifier::{BroadcastNotifier, MemberEvent, Notifier};
