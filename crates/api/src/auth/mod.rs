pub mod config;
pub mod jwt;
pub mod password;
pub mod permissions;

pub use config::AuthConfig;
pub use jwt::{Claims, JwtService, Role};
pub use password::PasswordService;
pub use permissions::{AdminAuth, MemberAuth};
