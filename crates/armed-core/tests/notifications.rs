mod common;

use armed_core::events::UnresolvedReason;
use armed_core::{NotificationEvent, PageRequest, SocialError};
use armed_db::entities::notification::NotificationType;
use common::{artist_with_track, create_notification, create_user, test_app};
use uuid::Uuid;

#[tokio::test]
async fn test_create_for_self_is_a_no_op() {
    let app = test_app().await;
    let a = create_user(&app.db, "ana").await;
    let notifier = app.social.notifications();

    let created = notifier
        .create(a.id, NotificationType::Follow, a.id, None)
        .await
        .unwrap();
    assert!(created.is_none());
    assert_eq!(notifier.get_unread_count(a.id).await.unwrap(), 0);
    assert_eq!(
        app.sink.events(),
        vec![NotificationEvent::SelfSuppressed {
            kind: NotificationType::Follow,
            actor_id: a.id,
        }]
    );
}

#[tokio::test]
async fn test_like_notification_for_missing_track_degrades() {
    let app = test_app().await;
    let b = create_user(&app.db, "ben").await;
    let track_id = Uuid::new_v4();

    let created = app
        .social
        .notifications()
        .create_like_notification(b.id, track_id)
        .await
        .unwrap();
    assert!(created.is_none());
    assert_eq!(
        app.sink.events(),
        vec![NotificationEvent::RecipientUnresolved {
            kind: NotificationType::Like,
            actor_id: b.id,
            track_id,
            reason: UnresolvedReason::TrackMissing,
        }]
    );
}

#[tokio::test]
async fn test_comment_notification_resolves_current_owner() {
    let app = test_app().await;
    let (a, _, track) = artist_with_track(&app.db, "ana").await;
    let b = create_user(&app.db, "ben").await;

    let created = app
        .social
        .notifications()
        .create_comment_notification(b.id, track.id)
        .await
        .unwrap()
        .expect("notification stored");
    assert_eq!(created.user_id, a.id);
    assert_eq!(created.kind, NotificationType::Comment);
    assert!(!created.read);
}

#[tokio::test]
async fn test_get_by_user_is_newest_first_and_paged() {
    let app = test_app().await;
    let (a, _, track) = artist_with_track(&app.db, "ana").await;
    let b = create_user(&app.db, "ben").await;
    let c = create_user(&app.db, "cleo").await;

    let oldest =
        create_notification(&app.db, a.id, NotificationType::Follow, b.id, None, 10).await;
    let middle =
        create_notification(&app.db, a.id, NotificationType::Like, c.id, Some(track.id), 20)
            .await;
    let newest =
        create_notification(&app.db, a.id, NotificationType::Comment, b.id, Some(track.id), 30)
            .await;
    // Someone else's notification never shows up.
    create_notification(&app.db, b.id, NotificationType::Follow, a.id, None, 40).await;

    let notifier = app.social.notifications();
    let page = notifier
        .get_by_user(a.id, PageRequest::default(), false)
        .await
        .unwrap();
    let ids: Vec<_> = page.notifications.iter().map(|n| n.notification.id).collect();
    assert_eq!(ids, [newest.id, middle.id, oldest.id]);
    assert_eq!(page.total, 3);
    assert_eq!(
        page.notifications[1].actor.as_ref().map(|u| u.id),
        Some(c.id)
    );
    assert_eq!(
        page.notifications[1].target.as_ref().map(|t| t.name.as_str()),
        Some("ana-first")
    );

    let second = notifier
        .get_by_user(a.id, PageRequest::new(Some(1), Some(1)), false)
        .await
        .unwrap();
    assert_eq!(second.total, 3);
    assert_eq!(second.notifications.len(), 1);
    assert_eq!(second.notifications[0].notification.id, middle.id);

    let past_end = notifier
        .get_by_user(a.id, PageRequest::new(None, Some(u64::MAX)), false)
        .await
        .unwrap();
    assert!(past_end.notifications.is_empty());
    assert_eq!(past_end.total, 3);
}

#[tokio::test]
async fn test_unread_only_filter() {
    let app = test_app().await;
    let a = create_user(&app.db, "ana").await;
    let b = create_user(&app.db, "ben").await;
    let read = create_notification(&app.db, a.id, NotificationType::Follow, b.id, None, 10).await;
    let unread =
        create_notification(&app.db, a.id, NotificationType::Follow, b.id, None, 20).await;

    let notifier = app.social.notifications();
    notifier.mark_as_read(read.id, a.id).await.unwrap();

    let page = notifier
        .get_by_user(a.id, PageRequest::default(), true)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.notifications[0].notification.id, unread.id);
}

#[tokio::test]
async fn test_mark_as_read_checks_recipient() {
    let app = test_app().await;
    let a = create_user(&app.db, "ana").await;
    let b = create_user(&app.db, "ben").await;
    let n = create_notification(&app.db, a.id, NotificationType::Follow, b.id, None, 0).await;
    let notifier = app.social.notifications();

    let err = notifier.mark_as_read(n.id, b.id).await.unwrap_err();
    assert!(matches!(err, SocialError::NotFound(_)));
    assert_eq!(err.public_message(), "Notification not found");
    assert_eq!(notifier.get_unread_count(a.id).await.unwrap(), 1);

    let marked = notifier.mark_as_read(n.id, a.id).await.unwrap();
    assert!(marked.read);
    assert_eq!(notifier.get_unread_count(a.id).await.unwrap(), 0);

    // Already read stays read.
    assert!(notifier.mark_as_read(n.id, a.id).await.unwrap().read);
}

#[tokio::test]
async fn test_mark_all_as_read_is_idempotent() {
    let app = test_app().await;
    let a = create_user(&app.db, "ana").await;
    let b = create_user(&app.db, "ben").await;
    for secs in 0..3 {
        create_notification(&app.db, a.id, NotificationType::Follow, b.id, None, secs).await;
    }
    create_notification(&app.db, b.id, NotificationType::Follow, a.id, None, 5).await;

    let notifier = app.social.notifications();
    assert_eq!(notifier.get_unread_count(a.id).await.unwrap(), 3);

    assert_eq!(notifier.mark_all_as_read(a.id).await.unwrap(), 3);
    assert_eq!(notifier.get_unread_count(a.id).await.unwrap(), 0);

    assert_eq!(notifier.mark_all_as_read(a.id).await.unwrap(), 0);
    assert_eq!(notifier.get_unread_count(a.id).await.unwrap(), 0);

    // Other recipients are untouched.
    assert_eq!(notifier.get_unread_count(b.id).await.unwrap(), 1);
}
