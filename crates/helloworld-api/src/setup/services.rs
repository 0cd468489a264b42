//! Collaborator wiring
//!
//! With `DATABASE_URL` set, greetings and users live in Postgres; otherwise the in-memory
//! stores are used. Mail goes out over SMTP when configured and is dropped otherwise.

use anyhow::{Context, Result};
use helloworld_core::{
    HelloworldConfig, NoOpNotifier, Notifier, RecordStore, SessionState, UserDirectory,
};
use helloworld_db::{GreetingRepository, UserRepository};
use helloworld_processing::{FormSchema, MediaValidator};
use helloworld_services::{
    CsrfTokenService, EmailService, FlashMessages, MemoryRecordStore, MemorySessionStore,
    MemoryUserDirectory, NotificationService, StaticAuthorization, SubmissionProcessor,
    UploadPipeline,
};
use helloworld_storage::LocalFileStore;
use std::sync::Arc;

use crate::state::AppState;

async fn setup_records(
    config: &HelloworldConfig,
) -> Result<(Arc<dyn RecordStore>, Arc<dyn UserDirectory>)> {
    match &config.database_url {
        Some(url) => {
            let pool = helloworld_db::connect(url, config.db_max_connections).await?;
            helloworld_db::run_migrations(&pool).await?;
            Ok((
                Arc::new(GreetingRepository::new(pool.clone())),
                Arc::new(UserRepository::new(pool)),
            ))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, greetings are kept in memory");
            Ok((
                Arc::new(MemoryRecordStore::new()),
                Arc::new(MemoryUserDirectory::new()),
            ))
        }
    }
}

fn setup_notifier(config: &HelloworldConfig) -> Result<Arc<dyn Notifier>> {
    match &config.smtp {
        Some(smtp) => Ok(Arc::new(
            EmailService::from_config(smtp).context("Failed to initialize email service")?,
        )),
        None => {
            tracing::info!("Email disabled, notifications are dropped");
            Ok(Arc::new(NoOpNotifier))
        }
    }
}

pub async fn initialize_services(config: HelloworldConfig) -> Result<Arc<AppState>> {
    let (records, users) = setup_records(&config).await?;

    let store = LocalFileStore::new(&config.media_root)
        .await
        .context("Failed to initialize media storage")?;
    tracing::info!(root = %store.root().display(), "Local media storage ready");

    let validator = MediaValidator::new(
        config.max_file_size_bytes,
        config.allowed_extensions.clone(),
        config.allowed_content_types.clone(),
    );
    let uploads = UploadPipeline::new(
        Arc::new(store),
        validator,
        config.image_path.clone(),
        config.filestore_timeout,
    );

    let notifications = NotificationService::new(
        setup_notifier(&config)?,
        users,
        config.user_to_email,
        config.notify_timeout,
    );

    let schema = FormSchema::add_greeting_form().context("Failed to load add-greeting form")?;
    let session: Arc<dyn SessionState> = Arc::new(MemorySessionStore::new());

    let processor = SubmissionProcessor::new(
        Arc::new(StaticAuthorization::new(config.allow_guest_submissions)),
        Arc::new(schema),
        records,
        uploads,
        notifications,
        session.clone(),
        Arc::new(CsrfTokenService::new(config.csrf_secret.clone())),
    );

    Ok(Arc::new(AppState {
        config,
        processor,
        flash: FlashMessages::new(session.clone()),
        session,
    }))
}
