//! Room store: the persistence service behind every room operation.
//!
//! All reads and writes go through [`RoomStore`]; successful writes publish a
//! change event so feed subscribers can re-read.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use thiserror::Error;
use uuid::Uuid;

use crate::entities::{room, RoomStatus};
use crate::feed::{ChangeEvent, ChangeFeed, ChangeKind};

/// Allowed range for `player_count`, inclusive.
pub const MIN_PLAYER_COUNT: i32 = 2;
pub const MAX_PLAYER_COUNT: i32 = 10;

/// Store operation failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("room {0} not found")]
    NotFound(Uuid),
    #[error("room {0} is not active")]
    NotActive(Uuid),
    #[error("backend error: {0}")]
    Backend(#[from] DbErr),
}

/// Caller-supplied fields for a new room.
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub game_name: String,
    pub player_count: i32,
    pub rule: String,
    pub amount_per_person: f64,
    pub owner_address: String,
    pub contact_info: Option<String>,
}

impl NewRoom {
    /// Check required fields and ranges.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` naming the first offending field.
    fn validate(&self) -> Result<(), StoreError> {
        if self.game_name.trim().is_empty() {
            return Err(StoreError::Validation("game_name is required".to_string()));
        }
        if self.rule.trim().is_empty() {
            return Err(StoreError::Validation("rule is required".to_string()));
        }
        if self.owner_address.trim().is_empty() {
            return Err(StoreError::Validation(
                "owner_address is required".to_string(),
            ));
        }
        if !(MIN_PLAYER_COUNT..=MAX_PLAYER_COUNT).contains(&self.player_count) {
            return Err(StoreError::Validation(format!(
                "player_count must be between {MIN_PLAYER_COUNT} and {MAX_PLAYER_COUNT}"
            )));
        }
        if !self.amount_per_person.is_finite() || self.amount_per_person < 0.0 {
            return Err(StoreError::Validation(
                "amount_per_person must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Service handle over the room table plus the change feed.
///
/// Cheap to clone: both fields are reference-counted.
#[derive(Debug, Clone)]
pub struct RoomStore {
    db: DatabaseConnection,
    feed: ChangeFeed,
}

impl RoomStore {
    #[must_use]
    pub const fn new(db: DatabaseConnection, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    /// The change feed writes publish into.
    #[must_use]
    pub const fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Insert a new room with a server-assigned id and timestamp.
    ///
    /// The record always starts `active`; callers cannot choose a status.
    ///
    /// # Errors
    ///
    /// `StoreError::Validation` for missing/out-of-range fields,
    /// `StoreError::Backend` if the insert fails.
    pub async fn create(&self, new_room: NewRoom) -> Result<room::Model, StoreError> {
        new_room.validate()?;

        let contact_info = new_room
            .contact_info
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let model = room::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_at: Set(Utc::now().fixed_offset()),
            game_name: Set(new_room.game_name.trim().to_string()),
            player_count: Set(new_room.player_count),
            rule: Set(new_room.rule.trim().to_string()),
            amount_per_person: Set(new_room.amount_per_person),
            owner_address: Set(new_room.owner_address.trim().to_string()),
            status: Set(RoomStatus::Active.as_str().to_string()),
            contact_info: Set(contact_info),
        };

        let inserted = model.insert(&self.db).await?;

        self.feed
            .publish(&ChangeEvent::room(ChangeKind::Insert, inserted.id));
        tracing::debug!(room_id = %inserted.id, game = %inserted.game_name, "room created");

        Ok(inserted)
    }

    /// All active rooms, newest first.
    ///
    /// # Errors
    ///
    /// `StoreError::Backend` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<room::Model>, StoreError> {
        let rooms = room::Entity::find()
            .filter(room::Column::Status.eq(RoomStatus::Active.as_str()))
            .order_by_desc(room::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rooms)
    }

    /// Fetch one room by id.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if no such room, `StoreError::Backend` on
    /// query failure.
    pub async fn get_by_id(&self, id: Uuid) -> Result<room::Model, StoreError> {
        room::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    /// Flip a room from `active` to `completed`.
    ///
    /// The update is conditional on the current status, so two concurrent
    /// settlements cannot both claim the flip: the second sees `NotActive`.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` for an unknown id, `StoreError::NotActive` if
    /// the room was already completed, `StoreError::Backend` on failure.
    pub async fn complete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = room::Entity::update_many()
            .col_expr(
                room::Column::Status,
                Expr::value(RoomStatus::Completed.as_str()),
            )
            .filter(room::Column::Id.eq(id))
            .filter(room::Column::Status.eq(RoomStatus::Active.as_str()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            // Distinguish a missing room from one that already completed.
            return match room::Entity::find_by_id(id).one(&self.db).await? {
                Some(_) => Err(StoreError::NotActive(id)),
                None => Err(StoreError::NotFound(id)),
            };
        }

        self.feed
            .publish(&ChangeEvent::room(ChangeKind::Update, id));
        tracing::info!(room_id = %id, "room completed");

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_room() -> NewRoom {
        NewRoom {
            game_name: "Dota 2".to_string(),
            player_count: 3,
            rule: "Best of 1".to_string(),
            amount_per_person: 0.2,
            owner_address: "ADDR1".to_string(),
            contact_info: None,
        }
    }

    #[test]
    fn validate_accepts_valid_input() {
        assert!(valid_room().validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_required_fields() {
        for field in ["game_name", "rule", "owner_address"] {
            let mut new_room = valid_room();
            match field {
                "game_name" => new_room.game_name = "  ".to_string(),
                "rule" => new_room.rule = String::new(),
                _ => new_room.owner_address = " ".to_string(),
            }
            let err = new_room.validate().unwrap_err();
            assert!(
                matches!(err, StoreError::Validation(ref msg) if msg.contains(field)),
                "expected validation error for {field}, got {err}"
            );
        }
    }

    #[test]
    fn validate_rejects_out_of_range_player_count() {
        for count in [1, 11, 0, -3] {
            let mut new_room = valid_room();
            new_room.player_count = count;
            assert!(matches!(
                new_room.validate(),
                Err(StoreError::Validation(_))
            ));
        }
        for count in [2, 10] {
            let mut new_room = valid_room();
            new_room.player_count = count;
            assert!(new_room.validate().is_ok());
        }
    }

    #[test]
    fn validate_rejects_bad_amounts() {
        for amount in [-0.1, f64::NAN, f64::INFINITY] {
            let mut new_room = valid_room();
            new_room.amount_per_person = amount;
            assert!(matches!(
                new_room.validate(),
                Err(StoreError::Validation(_))
            ));
        }
        let mut free = valid_room();
        free.amount_per_person = 0.0;
        assert!(free.validate().is_ok());
    }
}
