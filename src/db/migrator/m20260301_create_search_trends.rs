use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SearchTrends::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchTrends::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SearchTrends::Query).string().not_null())
                    .col(
                        ColumnDef::new(SearchTrends::SearchCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SearchTrends::DailyCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SearchTrends::WeeklyCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SearchTrends::LastSearched)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SearchTrends::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // The upsert relies on this index as its conflict target.
        manager
            .create_index(
                Index::create()
                    .name("idx_search_trends_query_unique")
                    .table(SearchTrends::Table)
                    .col(SearchTrends::Query)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_trends_last_searched")
                    .table(SearchTrends::Table)
                    .col(SearchTrends::LastSearched)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_trends_daily_count")
                    .table(SearchTrends::Table)
                    .col(SearchTrends::DailyCount)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_trends_weekly_count")
                    .table(SearchTrends::Table)
                    .col(SearchTrends::WeeklyCount)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SearchTrends::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SearchTrends {
    Table,
    Id,
    Query,
    SearchCount,
    DailyCount,
    WeeklyCount,
    LastSearched,
    CreatedAt,
}
