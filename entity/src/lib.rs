pub mod prelude;

pub mod golfer;
pub mod pick;
pub mod tournament;
pub mod tournament_result;
pub mod user;
