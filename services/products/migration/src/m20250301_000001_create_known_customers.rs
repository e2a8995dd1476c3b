use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(KnownCustomers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(KnownCustomers::CustomerId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(KnownCustomers::Name).string())
                    .col(ColumnDef::new(KnownCustomers::Email).string())
                    .col(
                        ColumnDef::new(KnownCustomers::Version)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(KnownCustomers::DeletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(KnownCustomers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum KnownCustomers {
    Table,
    CustomerId,
    Name,
    Email,
    Version,
    DeletedAt,
}
