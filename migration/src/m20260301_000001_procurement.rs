use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Requisitions {
    Table,
    Id,
    Title,
    Description,
    Department,
    RequesterId,
    Quantity,
    EstimatedCostCents,
    Status,
    DecidedBy,
    DecidedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Requisitions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Requisitions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Requisitions::Title).string().not_null())
                    .col(ColumnDef::new(Requisitions::Description).text().null())
                    .col(ColumnDef::new(Requisitions::Department).string().not_null())
                    .col(ColumnDef::new(Requisitions::RequesterId).string().not_null())
                    .col(
                        ColumnDef::new(Requisitions::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Requisitions::EstimatedCostCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Requisitions::Status)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(Requisitions::DecidedBy).string().null())
                    .col(
                        ColumnDef::new(Requisitions::DecidedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Requisitions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Requisitions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_requisitions_status")
                    .table(Requisitions::Table)
                    .col(Requisitions::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_requisitions_requester")
                    .table(Requisitions::Table)
                    .col(Requisitions::RequesterId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Requisitions::Table).if_exists().to_owned())
            .await
    }
}
