//! Postgres implementation of the TemplateRepository trait

use std::{collections::BTreeMap, path::PathBuf};

use async_trait::async_trait;
use sqlx::{query_as, FromRow};
use uuid::Uuid;

use crate::{
    domain::mail::{
        errors::GetTemplateError, MailFile, MailFromEmail, MailTemplate, TemplateRepository,
        Translation,
    },
    infrastructure::db::postgres::PostgresDatabase,
};

#[derive(FromRow)]
struct TemplateRecord {
    id: Uuid,
    slug: String,
    subject: String,
    message: String,
    is_html: bool,
    is_active: bool,
    from_name: Option<String>,
    from_email: Option<String>,
}

#[derive(FromRow)]
struct TranslationRecord {
    locale: String,
    subject: Option<String>,
    message: Option<String>,
}

#[derive(FromRow)]
struct FileRecord {
    name: String,
    filename: String,
}

impl TemplateRecord {
    fn into_template(
        self,
        translations: Vec<TranslationRecord>,
        files: Vec<FileRecord>,
    ) -> MailTemplate {
        MailTemplate {
            id: self.id,
            slug: self.slug,
            subject: self.subject,
            message: self.message,
            is_html: self.is_html,
            is_active: self.is_active,
            from_email: self.from_email.map(|email| MailFromEmail {
                name: self.from_name,
                email,
            }),
            translations: translations
                .into_iter()
                .map(|record| {
                    (
                        record.locale,
                        Translation {
                            subject: record.subject,
                            message: record.message,
                        },
                    )
                })
                .collect::<BTreeMap<_, _>>(),
            files: files
                .into_iter()
                .map(|record| MailFile {
                    name: record.name,
                    path: PathBuf::from(record.filename),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl TemplateRepository for PostgresDatabase {
    #[mutants::skip]
    async fn get_by_slug(&self, slug: &str) -> Result<MailTemplate, GetTemplateError> {
        let record = query_as::<_, TemplateRecord>(
            r#"
            SELECT
                t.id,
                t.slug,
                t.subject,
                t.message,
                t.is_html,
                t.is_active,
                f.name AS from_name,
                f.email AS from_email
            FROM mail_templates t
            LEFT JOIN mail_from_emails f ON f.id = t.from_email_id
            WHERE t.slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| GetTemplateError::NotFound(slug.to_string()))?;

        let translations = query_as::<_, TranslationRecord>(
            r#"
            SELECT locale, subject, message
            FROM mail_template_translations
            WHERE template_id = $1
            "#,
        )
        .bind(record.id)
        .fetch_all(&self.pool)
        .await?;

        let files = query_as::<_, FileRecord>(
            r#"
            SELECT name, filename
            FROM mail_files
            WHERE template_id = $1
            ORDER BY id
            "#,
        )
        .bind(record.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(record.into_template(translations, files))
    }
}
