use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========================================
        // COUNTERS TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(Counters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Counters::Name)
                            .string_len(100)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Counters::Seq)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // ========================================
        // PARTICIPANTS TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(Participants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participants::Pid)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Participants::Name).text().not_null())
                    .col(ColumnDef::new(Participants::Email).text().not_null())
                    .col(ColumnDef::new(Participants::Phone).text().not_null())
                    .col(ColumnDef::new(Participants::CollegeName).text().not_null())
                    .col(
                        ColumnDef::new(Participants::YearOfStudy)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Participants::DualBoot)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Participants::MailSent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Participants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Participants::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_participants_email")
                    .table(Participants::Table)
                    .col(Participants::Email)
                    .to_owned(),
            )
            .await?;

        // ========================================
        // REGISTRATIONS TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(Registrations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Registrations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Registrations::NumOfParticipants)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Registrations::Participants).json().not_null())
                    .col(
                        ColumnDef::new(Registrations::TotalAmount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Registrations::TransactionId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Registrations::TransactionImage)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Registrations::ReferralCode)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Registrations::MailSent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Registrations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Registrations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Transaction ids are looked up by the organisers when verifying payments
        manager
            .create_index(
                Index::create()
                    .name("idx_registrations_transaction_id")
                    .table(Registrations::Table)
                    .col(Registrations::TransactionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Registrations::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Participants::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Counters::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Counters {
    Table,
    Name,
    Seq,
}

#[derive(DeriveIden)]
enum Participants {
    Table,
    Pid,
    Name,
    Email,
    Phone,
    CollegeName,
    YearOfStudy,
    DualBoot,
    MailSent,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Registrations {
    Table,
    Id,
    NumOfParticipants,
    Participants,
    TotalAmount,
    TransactionId,
    TransactionImage,
    ReferralCode,
    MailSent,
    CreatedAt,
    UpdatedAt,
}
