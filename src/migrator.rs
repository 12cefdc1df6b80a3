use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_snapshots_table::Migration),
            Box::new(m20240101_000002_create_zone_entries_table::Migration),
            Box::new(m20240101_000003_create_users_table::Migration),
        ]
    }
}

mod m20240101_000001_create_snapshots_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_snapshots_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Snapshots::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Snapshots::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Snapshots::ZoneKind).string_len(16).not_null())
                        .col(ColumnDef::new(Snapshots::PlannedDays).json().not_null())
                        .col(ColumnDef::new(Snapshots::RealizedDays).json().not_null())
                        .col(
                            ColumnDef::new(Snapshots::SupplementaryDays)
                                .json()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Snapshots::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_snapshots_kind_created_at")
                        .table(Snapshots::Table)
                        .col(Snapshots::ZoneKind)
                        .col(Snapshots::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Snapshots::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Snapshots {
        Table,
        Id,
        ZoneKind,
        PlannedDays,
        RealizedDays,
        SupplementaryDays,
        CreatedAt,
    }
}

mod m20240101_000002_create_zone_entries_table {
    use super::m20240101_000001_create_snapshots_table::Snapshots;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_zone_entries_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ZoneEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ZoneEntries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ZoneEntries::SnapshotId).uuid().not_null())
                        .col(ColumnDef::new(ZoneEntries::Position).integer().not_null())
                        .col(ColumnDef::new(ZoneEntries::Zone).string().not_null())
                        .col(ColumnDef::new(ZoneEntries::PlannedCount).double().not_null())
                        .col(
                            ColumnDef::new(ZoneEntries::RealizedCount)
                                .double()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ZoneEntries::SupplementaryCount).double().null())
                        .col(
                            ColumnDef::new(ZoneEntries::PlannedSharePct)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ZoneEntries::RealizedSharePct)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ZoneEntries::SupplementarySharePct)
                                .double()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_zone_entries_snapshot")
                                .from(ZoneEntries::Table, ZoneEntries::SnapshotId)
                                .to(Snapshots::Table, Snapshots::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_zone_entries_snapshot_id")
                        .table(ZoneEntries::Table)
                        .col(ZoneEntries::SnapshotId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_zone_entries_zone")
                        .table(ZoneEntries::Table)
                        .col(ZoneEntries::Zone)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ZoneEntries::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ZoneEntries {
        Table,
        Id,
        SnapshotId,
        Position,
        Zone,
        PlannedCount,
        RealizedCount,
        SupplementaryCount,
        PlannedSharePct,
        RealizedSharePct,
        SupplementarySharePct,
    }
}

mod m20240101_000003_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Users::Username)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Role).string().not_null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Username,
        PasswordHash,
        Role,
        CreatedAt,
    }
}
