use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(pk_uuid(AuditLogs::Id))
                    .col(string_len(AuditLogs::Module, 64))
                    .col(string_len(AuditLogs::Operation, 16))
                    .col(text(AuditLogs::Description))
                    .col(string_null(AuditLogs::Resource))
                    .col(string_null(AuditLogs::IpAddress))
                    .col(text_null(AuditLogs::UserAgent))
                    .col(
                        timestamp_with_time_zone(AuditLogs::OccurredAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_logs_module_occurred_at")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::Module)
                    .col(AuditLogs::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_logs_resource")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::Resource)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum AuditLogs {
    Table,
    Id,
    Module,
    Operation,
    Description,
    Resource,
    IpAddress,
    UserAgent,
    OccurredAt,
}
