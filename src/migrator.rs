use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_courses_table::Migration),
            Box::new(m20240101_000003_create_purchases_table::Migration),
            Box::new(m20240101_000004_create_reviews_table::Migration),
            Box::new(m20240101_000005_create_contact_messages_table::Migration),
        ]
    }
}

mod m20240101_000001_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_users_table"
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
                        .col(ColumnDef::new(Users::Username).string().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(
                            ColumnDef::new(Users::IsAdmin)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Users::CreatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_email")
                        .table(Users::Table)
                        .col(Users::Email)
                        .unique()
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

    #[derive(Iden)]
    enum Users {
        Table,
        Id,
        Username,
        Email,
        PasswordHash,
        IsAdmin,
        CreatedAt,
    }
}

mod m20240101_000002_create_courses_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_courses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Courses::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Courses::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Courses::Title).string().not_null())
                        .col(ColumnDef::new(Courses::Description).text().not_null())
                        .col(
                            ColumnDef::new(Courses::DetailedDescription)
                                .text()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Courses::Price).decimal().not_null())
                        .col(ColumnDef::new(Courses::ThumbnailLink).string().not_null())
                        .col(ColumnDef::new(Courses::VideoLink).string().null())
                        .col(ColumnDef::new(Courses::ResourceLink).string().null())
                        .col(ColumnDef::new(Courses::CreatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Courses::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Courses {
        Table,
        Id,
        Title,
        Description,
        DetailedDescription,
        Price,
        ThumbnailLink,
        VideoLink,
        ResourceLink,
        CreatedAt,
    }
}

mod m20240101_000003_create_purchases_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_purchases_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Purchases::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Purchases::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Purchases::CourseId).uuid().not_null())
                        .col(ColumnDef::new(Purchases::UserEmail).string().not_null())
                        .col(ColumnDef::new(Purchases::Status).string().not_null())
                        .col(ColumnDef::new(Purchases::SessionId).string().not_null())
                        .col(ColumnDef::new(Purchases::AmountMinor).big_integer().null())
                        .col(ColumnDef::new(Purchases::CreatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await?;

            // The unique index on session_id is what makes the two
            // reconciliation paths converge to a single row.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchases_session_id")
                        .table(Purchases::Table)
                        .col(Purchases::SessionId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // Serves the paid-count aggregation behind discount pricing.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchases_course_status")
                        .table(Purchases::Table)
                        .col(Purchases::CourseId)
                        .col(Purchases::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchases_user_email")
                        .table(Purchases::Table)
                        .col(Purchases::UserEmail)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Purchases::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Purchases {
        Table,
        Id,
        CourseId,
        UserEmail,
        Status,
        SessionId,
        AmountMinor,
        CreatedAt,
    }
}

mod m20240101_000004_create_reviews_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_reviews_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Reviews::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Reviews::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Reviews::CourseId).uuid().null())
                        .col(ColumnDef::new(Reviews::UserEmail).string().not_null())
                        .col(ColumnDef::new(Reviews::UserName).string().not_null())
                        .col(ColumnDef::new(Reviews::Rating).small_integer().not_null())
                        .col(ColumnDef::new(Reviews::Comment).text().not_null())
                        .col(
                            ColumnDef::new(Reviews::Approved)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Reviews::CreatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_reviews_course_id")
                        .table(Reviews::Table)
                        .col(Reviews::CourseId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Reviews::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Reviews {
        Table,
        Id,
        CourseId,
        UserEmail,
        UserName,
        Rating,
        Comment,
        Approved,
        CreatedAt,
    }
}

mod m20240101_000005_create_contact_messages_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_contact_messages_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ContactMessages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ContactMessages::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ContactMessages::Name).string().not_null())
                        .col(ColumnDef::new(ContactMessages::Email).string().not_null())
                        .col(ColumnDef::new(ContactMessages::Subject).string().null())
                        .col(ColumnDef::new(ContactMessages::Message).text().not_null())
                        .col(
                            ColumnDef::new(ContactMessages::IsRead)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(ContactMessages::ReplyText).text().null())
                        .col(ColumnDef::new(ContactMessages::RepliedBy).string().null())
                        .col(
                            ColumnDef::new(ContactMessages::RepliedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ContactMessages::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ContactMessages::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum ContactMessages {
        Table,
        Id,
        Name,
        Email,
        Subject,
        Message,
        IsRead,
        ReplyText,
        RepliedBy,
        RepliedAt,
        CreatedAt,
    }
}
