pub mod badge;
pub mod enrollment;
pub mod ledger;
pub mod lesson;
pub mod user;
pub mod user_badge;

pub use badge::{Category, CriteriaType};
pub use enrollment::{ContentKind, Status};
pub use user::Role;
