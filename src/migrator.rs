use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251018_000001_create_stores_table::Migration),
            Box::new(m20251018_000002_create_stock_history_table::Migration),
        ]
    }
}

mod m20251018_000001_create_stores_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20251018_000001_create_stores_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Stores::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Stores::StoreId)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Stores::StoreName).string().not_null())
                        .col(ColumnDef::new(Stores::AreaCode).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stores_area_code")
                        .table(Stores::Table)
                        .col(Stores::AreaCode)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Stores::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Stores {
        Table,
        StoreId,
        StoreName,
        AreaCode,
    }
}

mod m20251018_000002_create_stock_history_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20251018_000002_create_stock_history_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockHistory::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(StockHistory::Timestamp)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockHistory::StoreId).string().not_null())
                        .col(ColumnDef::new(StockHistory::ProductName).string().not_null())
                        .col(
                            ColumnDef::new(StockHistory::StockStatus)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockHistory::StockCount).integer().not_null())
                        .col(
                            ColumnDef::new(StockHistory::Price)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockHistory::DaysOfInventory)
                                .double()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockHistory::IsOosAlert).boolean().not_null())
                        .to_owned(),
                )
                .await?;

            // Serves the latest-per-(store, product) window
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_history_store_product_ts")
                        .table(StockHistory::Table)
                        .col(StockHistory::StoreId)
                        .col(StockHistory::ProductName)
                        .col(StockHistory::Timestamp)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockHistory::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockHistory {
        Table,
        Id,
        Timestamp,
        StoreId,
        ProductName,
        StockStatus,
        StockCount,
        Price,
        DaysOfInventory,
        IsOosAlert,
    }
}
