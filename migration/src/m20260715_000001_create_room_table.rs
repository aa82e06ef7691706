use sea_orm_migration::prelude::*;

/// Creates the `room` table: one flat record per published game request.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Room {
    Table,
    Id,
    CreatedAt,
    GameName,
    PlayerCount,
    Rule,
    AmountPerPerson,
    OwnerAddress,
    Status,
    ContactInfo,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Room::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Room::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Room::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Room::GameName).string().not_null())
                    .col(ColumnDef::new(Room::PlayerCount).integer().not_null())
                    .col(ColumnDef::new(Room::Rule).text().not_null())
                    .col(ColumnDef::new(Room::AmountPerPerson).double().not_null())
                    .col(ColumnDef::new(Room::OwnerAddress).string().not_null())
                    .col(
                        ColumnDef::new(Room::Status)
                            .string_len(20)
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Room::ContactInfo).text().null())
                    .to_owned(),
            )
            .await?;

        // The listing always filters on status and sorts by creation time.
        manager
            .create_index(
                Index::create()
                    .name("idx_room_status_created_at")
                    .table(Room::Table)
                    .col(Room::Status)
                    .col(Room::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Room::Table).to_owned())
            .await
    }
}
