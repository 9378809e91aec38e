pub mod badge;
pub mod enrollment;
pub mod gamification;
pub mod points;
pub mod progress;
pub mod streak;
pub mod user;

pub use badge::Badge;
pub use enrollment::Enrollment;
pub use gamification::Gamification;
pub use points::Points;
pub use progress::Progress;
pub use streak::Streak;
pub use user::User;
