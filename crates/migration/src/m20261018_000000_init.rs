//! Initial schema of the ledger store:
//!
//! - `accounts`: bank accounts and cash boxes
//! - `account_balances`: one balance row per account and currency
//! - `operations`: the journal of every account

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Name,
    Owner,
    IsPrivate,
    AllowedCurrencies,
    Archived,
    CreatedAt,
}

#[derive(Iden)]
enum AccountBalances {
    Table,
    AccountId,
    Currency,
    Amount,
}

#[derive(Iden)]
enum Operations {
    Table,
    Id,
    AccountId,
    Kind,
    Amount,
    Currency,
    Tag,
    RegisteredAt,
    MadeBy,
    PairId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::Owner).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::IsPrivate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    // Comma separated codes, NULL for multi-currency accounts.
                    .col(ColumnDef::new(Accounts::AllowedCurrencies).string())
                    .col(
                        ColumnDef::new(Accounts::Archived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-owner")
                    .table(Accounts::Table)
                    .col(Accounts::Owner)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AccountBalances::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AccountBalances::AccountId).string().not_null())
                    .col(ColumnDef::new(AccountBalances::Currency).string().not_null())
                    // Decimal text, never a float.
                    .col(ColumnDef::new(AccountBalances::Amount).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(AccountBalances::AccountId)
                            .col(AccountBalances::Currency),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-account_balances-account_id")
                            .from(AccountBalances::Table, AccountBalances::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Operations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Operations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Operations::AccountId).string().not_null())
                    .col(ColumnDef::new(Operations::Kind).string().not_null())
                    .col(ColumnDef::new(Operations::Amount).string().not_null())
                    .col(ColumnDef::new(Operations::Currency).string().not_null())
                    .col(ColumnDef::new(Operations::Tag).string())
                    .col(
                        ColumnDef::new(Operations::RegisteredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Operations::MadeBy).string().not_null())
                    .col(ColumnDef::new(Operations::PairId).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-operations-account_id")
                            .from(Operations::Table, Operations::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-operations-account_id-registered_at")
                    .table(Operations::Table)
                    .col(Operations::AccountId)
                    .col(Operations::RegisteredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-operations-pair_id")
                    .table(Operations::Table)
                    .col(Operations::PairId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Operations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AccountBalances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
