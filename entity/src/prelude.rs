pub use super::golfer::Entity as Golfer;
pub use super::pick::Entity as Pick;
pub use super::tournament::Entity as Tournament;
pub use super::tournament_result::Entity as TournamentResult;
pub use super::user::Entity as User;
