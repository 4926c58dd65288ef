use entity::{tournament, tournament_result};
use sea_orm::ActiveValue::{NotSet, Set};

use super::*;

impl TournamentInput {
    pub(super) fn into_active_model(self) -> tournament::ActiveModel {
        tournament::ActiveModel {
            id: NotSet,
            name: Set(self.name.trim().to_string()),
            start_date: Set(self.start_date),
            end_date: Set(self.end_date),
            is_major: Set(self.is_major),
            is_signature: Set(self.is_signature),
            season: Set(self.season),
            purse: Set(self.purse),
            catalog_id: NotSet,
            live_golf_id: NotSet,
        }
    }
}

impl ResultInput {
    pub(super) fn active_result(&self) -> tournament_result::ActiveModel {
        tournament_result::ActiveModel {
            id: NotSet,
            tournament_id: Set(self.tournament_id),
            golfer_id: Set(self.golfer_id),
            purse: Set(self.purse),
            position: Set(self.position),
        }
    }
}
