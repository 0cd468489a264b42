//! Notification behavior: recipient resolution, subject wording, failure isolation.

mod helpers;

use async_trait::async_trait;
use helloworld_core::models::Principal;
use helloworld_core::{AppError, Notifier};
use helloworld_services::{MemoryUserDirectory, NotificationService};
use helpers::{admin, BrokenUserDirectory, RecordingNotifier, ADMIN_ID};
use std::sync::Arc;
use std::time::Duration;

fn service(
    notifier: Arc<dyn Notifier>,
    recipient_id: Option<i64>,
) -> NotificationService {
    NotificationService::new(
        notifier,
        Arc::new(MemoryUserDirectory::new().with_user(admin())),
        recipient_id,
        Duration::from_secs(5),
    )
}

#[test]
fn test_subject_names_submitter() {
    assert_eq!(
        NotificationService::subject_for(&Principal::user(3, "bob", "s")),
        "New helloworld message added by bob"
    );
    assert_eq!(
        NotificationService::subject_for(&Principal::anonymous("s")),
        "New helloworld message added by a visitor to the site"
    );
    assert_eq!(NotificationService::body_for("Hi"), "New greeting is Hi");
}

#[tokio::test]
async fn test_sends_to_configured_recipient() {
    let notifier = Arc::new(RecordingNotifier::default());
    let service = service(notifier.clone(), Some(ADMIN_ID));

    assert!(service.notify_new_greeting(&Principal::anonymous("s"), "Hello").await);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "admin@example.com");
    assert_eq!(sent[0].subject, "New helloworld message added by a visitor to the site");
}

#[tokio::test]
async fn test_unset_or_non_positive_recipient_sends_nothing() {
    let notifier = Arc::new(RecordingNotifier::default());

    for recipient in [None, Some(0), Some(-1)] {
        let service = service(notifier.clone(), recipient);
        assert!(!service.notify_new_greeting(&Principal::anonymous("s"), "Hello").await);
    }
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_unknown_recipient_is_swallowed() {
    let notifier = Arc::new(RecordingNotifier::default());
    let service = service(notifier.clone(), Some(99));

    assert!(!service.notify_new_greeting(&Principal::anonymous("s"), "Hello").await);
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_directory_and_transport_failures_are_swallowed() {
    let broken_directory = NotificationService::new(
        Arc::new(RecordingNotifier::default()),
        Arc::new(BrokenUserDirectory),
        Some(ADMIN_ID),
        Duration::from_secs(5),
    );
    assert!(!broken_directory.notify_new_greeting(&Principal::anonymous("s"), "Hello").await);

    let broken_transport = service(Arc::new(RecordingNotifier::failing()), Some(ADMIN_ID));
    assert!(!broken_transport.notify_new_greeting(&Principal::anonymous("s"), "Hello").await);
}

struct StalledNotifier;

#[async_trait]
impl Notifier for StalledNotifier {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), AppError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }
}

#[tokio::test]
async fn test_slow_transport_times_out() {
    let service = NotificationService::new(
        Arc::new(StalledNotifier),
        Arc::new(MemoryUserDirectory::new().with_user(admin())),
        Some(ADMIN_ID),
        Duration::from_millis(50),
    );

    assert!(!service.notify_new_greeting(&Principal::anonymous("s"), "Hello").await);
}
