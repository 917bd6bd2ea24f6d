//! Coordinator flows against an in-memory album service on tokio's paused clock

mod common;

use common::*;
use folio_model::{fixtures, Folder, FolderId};
use folio_sync::{
    Activity, AlbumAccess, AutoSaveOutcome, CheckOutcome, RemoteError, SaveOutcome, SkipReason,
    SyncError, VersionCheck,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

#[tokio::test(start_paused = true)]
async fn test_clean_document_is_not_saved() {
    let remote = Arc::new(MockRemote::new(fixtures::sample_tree()));
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);

    assert_eq!(sync.auto_save_tick().await, AutoSaveOutcome::Clean);
    assert_eq!(sync.force_save().await, Ok(SaveOutcome::UpToDate));
    assert_eq!(remote.persist_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_during_outstanding_save_persist_once() {
    let remote = Arc::new(
        MockRemote::new(fixtures::sample_tree()).with_persist_delay(Duration::from_secs(10)),
    );
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);
    sync.document().apply(theme("winter")).unwrap();

    let first = {
        let sync = Arc::clone(&sync);
        tokio::spawn(async move { sync.auto_save_tick().await })
    };
    time::sleep(Duration::from_secs(1)).await;
    assert!(sync.is_saving());

    assert_eq!(
        sync.auto_save_tick().await,
        AutoSaveOutcome::Skipped(SkipReason::Busy(Activity::Saving))
    );

    match first.await.unwrap() {
        AutoSaveOutcome::Saved(marker) => assert_eq!(marker.version, 6),
        other => panic!("expected a save, got {other:?}"),
    }
    assert_eq!(remote.persist_calls(), 1);
    assert!(!sync.is_saving());
}

#[tokio::test(start_paused = true)]
async fn test_failed_persist_is_retried_on_next_tick() {
    let remote = Arc::new(MockRemote::new(fixtures::sample_tree()));
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);
    remote.fail_persist(server_error(503));

    sync.document().apply(theme("winter")).unwrap();

    assert_eq!(
        sync.auto_save_tick().await,
        AutoSaveOutcome::Failed(SyncError::Persist(server_error(503)))
    );
    // Auto-save makes a single attempt per tick
    assert_eq!(remote.persist_calls(), 1);
    assert!(sync.document().has_unsaved_change());
    assert!(sync.status().last_error.is_some());

    assert!(matches!(
        sync.auto_save_tick().await,
        AutoSaveOutcome::Saved(_)
    ));
    assert!(!sync.document().has_unsaved_change());
    assert_eq!(sync.status().last_error, None);

    let saved = sync.document().snapshot();
    assert_eq!(saved.attributes.theme_id.as_deref(), Some("winter"));
    assert_eq!(saved.version, 6);
    assert_eq!(remote.server_tree(), saved);
}

#[tokio::test(start_paused = true)]
async fn test_auto_save_respects_access_and_blocking() {
    let remote = Arc::new(MockRemote::new(fixtures::sample_tree()));
    let auth = Arc::new(MockAuth::signed_in());
    let access = Arc::new(AlbumAccess::new(true, true));
    let sync = coordinator_with_access(&remote, &auth, Arc::clone(&access));
    sync.document().apply(theme("winter")).unwrap();

    assert_eq!(sync.auto_save_tick().await, AutoSaveOutcome::NotEligible);

    access.set_locked(false);
    access.set_owned(false);
    assert_eq!(sync.auto_save_tick().await, AutoSaveOutcome::NotEligible);

    access.set_owned(true);
    let checkout = sync.begin_blocking_operation();
    assert_eq!(
        sync.auto_save_tick().await,
        AutoSaveOutcome::Skipped(SkipReason::Blocked)
    );
    assert_eq!(remote.persist_calls(), 0);

    drop(checkout);
    assert!(matches!(
        sync.auto_save_tick().await,
        AutoSaveOutcome::Saved(_)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_force_save_refuses_to_overlap() {
    let remote = Arc::new(
        MockRemote::new(fixtures::sample_tree()).with_persist_delay(Duration::from_secs(10)),
    );
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);
    sync.document().apply(theme("winter")).unwrap();

    let first = {
        let sync = Arc::clone(&sync);
        tokio::spawn(async move { sync.force_save().await })
    };
    time::sleep(Duration::from_secs(1)).await;

    assert_eq!(sync.force_save().await, Err(SyncError::SaveInFlight));
    assert!(matches!(first.await.unwrap(), Ok(SaveOutcome::Saved(_))));
    assert_eq!(remote.persist_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_force_save_retries_transient_failures() {
    let remote = Arc::new(MockRemote::new(fixtures::sample_tree()));
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);
    remote.fail_persist(RemoteError::Network("connection reset".to_string()));
    remote.fail_persist(server_error(502));

    sync.document().apply(theme("winter")).unwrap();
    let started = time::Instant::now();

    assert!(matches!(sync.force_save().await, Ok(SaveOutcome::Saved(_))));
    assert_eq!(remote.persist_calls(), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_conflict_replaces_tree_and_clears_history() {
    let remote = Arc::new(MockRemote::new(fixtures::sample_tree()));
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);

    let mut newer = fixtures::sample_tree();
    newer.version = 7;
    newer.attributes.theme_id = Some("autumn".to_string());
    remote.script_check(Ok(VersionCheck::stale(Some(newer.clone()))));

    sync.document().apply(theme("winter")).unwrap();
    let local = sync.document().marker();
    assert_eq!(local.version, 5);

    match sync.force_check().await.unwrap() {
        CheckOutcome::Replaced {
            from,
            to,
            corrections,
        } => {
            assert_eq!(from, local);
            assert_eq!(to.version, 7);
            assert!(corrections.is_empty());
        }
        other => panic!("expected a replacement, got {other:?}"),
    }

    assert_eq!(sync.document().snapshot(), newer);
    assert!(!sync.document().undo());
    assert!(!sync.document().has_unsaved_change());
    // The conflict tree came with the answer
    assert_eq!(remote.fetch_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stale_check_without_tree_fetches() {
    let remote = Arc::new(MockRemote::new(fixtures::sample_tree()));
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);

    let mut newer = fixtures::sample_tree();
    newer.version = 8;
    remote.set_server_tree(newer.clone());

    let outcome = sync.poll_tick().await.unwrap();
    assert!(matches!(outcome, CheckOutcome::Replaced { .. }));
    assert_eq!(remote.fetch_calls(), 1);
    assert_eq!(sync.document().marker(), newer.marker());

    assert_eq!(sync.poll_tick().await, Ok(CheckOutcome::Current));
}

#[tokio::test(start_paused = true)]
async fn test_older_remote_tree_is_ignored() {
    let remote = Arc::new(MockRemote::new(fixtures::sample_tree()));
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);

    let mut older = fixtures::sample_tree();
    older.version = 4;
    older.attributes.theme_id = None;
    remote.script_check(Ok(VersionCheck::stale(Some(older.clone()))));

    sync.document().apply(theme("winter")).unwrap();

    assert_eq!(
        sync.force_check().await,
        Ok(CheckOutcome::Ignored(older.marker()))
    );
    assert_eq!(sync.document().marker().version, 5);
    assert!(sync.document().has_unsaved_change());
    assert!(sync.document().lock().can_undo());
}

#[tokio::test(start_paused = true)]
async fn test_poll_is_skipped_while_saving() {
    let remote = Arc::new(
        MockRemote::new(fixtures::sample_tree()).with_persist_delay(Duration::from_secs(10)),
    );
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);
    sync.document().apply(theme("winter")).unwrap();

    let save = {
        let sync = Arc::clone(&sync);
        tokio::spawn(async move { sync.force_save().await })
    };
    time::sleep(Duration::from_secs(1)).await;

    assert_eq!(
        sync.poll_tick().await,
        Ok(CheckOutcome::Skipped(SkipReason::Busy(Activity::Saving)))
    );
    assert_eq!(remote.check_calls(), 0);

    assert!(save.await.unwrap().is_ok());
    assert_eq!(sync.poll_tick().await, Ok(CheckOutcome::Current));
    assert_eq!(remote.check_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_force_check_waits_for_save() {
    let remote = Arc::new(
        MockRemote::new(fixtures::sample_tree()).with_persist_delay(Duration::from_secs(10)),
    );
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);
    sync.document().apply(theme("winter")).unwrap();

    let save = {
        let sync = Arc::clone(&sync);
        tokio::spawn(async move { sync.force_save().await })
    };
    time::sleep(Duration::from_secs(1)).await;

    // Runs once the save released the gate, against the new marker
    assert_eq!(sync.force_check().await, Ok(CheckOutcome::Current));
    assert!(save.is_finished());
    assert_eq!(sync.document().marker().version, 6);
}

#[tokio::test(start_paused = true)]
async fn test_delete_images_is_optimistic() {
    let remote = Arc::new(MockRemote::new(fixtures::sample_tree()));
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);

    let outcome = sync.delete_images(vec![FolderId::new(111)]).await;
    assert!(matches!(outcome, Ok(SaveOutcome::Saved(_))));

    let local = sync.document().snapshot();
    assert!(!local.book.contains(FolderId::new(111)));
    assert!(local.book.image_for(FolderId::new(111)).is_none());
    assert_eq!(remote.deleted_ids(), vec![FolderId::new(111)]);
    assert!(sync.pending_deletions().is_empty());
    assert!(!sync.document().has_unsaved_change());
}

#[tokio::test(start_paused = true)]
async fn test_failed_delete_is_sent_with_next_save() {
    let remote = Arc::new(MockRemote::new(fixtures::sample_tree()));
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);
    for _ in 0..3 {
        remote.fail_persist(server_error(503));
    }

    let outcome = sync.delete_images(vec![FolderId::new(212)]).await;
    assert_eq!(outcome, Err(SyncError::Persist(server_error(503))));

    // Removed locally even though the remote never heard of it
    assert!(!sync.document().snapshot().book.contains(FolderId::new(212)));
    assert_eq!(sync.pending_deletions(), vec![FolderId::new(212)]);
    assert!(remote.deleted_ids().is_empty());

    assert!(matches!(
        sync.auto_save_tick().await,
        AutoSaveOutcome::Saved(_)
    ));
    assert_eq!(remote.deleted_ids(), vec![FolderId::new(212)]);
    assert!(sync.pending_deletions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_delete_images_only_queues_removed_slots() {
    let remote = Arc::new(MockRemote::new(fixtures::sample_tree()));
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);

    // 11 is a page, 901 lives in the cover
    let ids = vec![FolderId::new(11), FolderId::new(901), FolderId::new(112)];
    let outcome = sync.delete_images(ids).await;
    assert!(matches!(outcome, Ok(SaveOutcome::Saved(_))));

    let local = sync.document().snapshot();
    assert!(local.book.contains(FolderId::new(11)));
    assert!(local.cover.contains(FolderId::new(901)));
    assert!(!local.book.contains(FolderId::new(112)));
    assert_eq!(remote.deleted_ids(), vec![FolderId::new(112)]);
}

#[tokio::test(start_paused = true)]
async fn test_delete_images_without_slots_queues_nothing() {
    let remote = Arc::new(MockRemote::new(fixtures::sample_tree()));
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);

    let outcome = sync.delete_images(vec![FolderId::new(2)]).await;
    assert_eq!(outcome, Ok(SaveOutcome::UpToDate));

    assert!(sync.document().snapshot().book.contains(FolderId::new(2)));
    assert!(sync.pending_deletions().is_empty());
    assert_eq!(remote.persist_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_newer_tree_without_fitting_layout_still_replaces() {
    let remote = Arc::new(MockRemote::new(fixtures::sample_tree()));
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);

    // No layout holds six photos
    let mut newer = fixtures::sample_tree();
    newer.version = 9;
    newer.book.folders[1].children[1].children =
        (0..6).map(|i| Folder::new(2200 + i)).collect();
    remote.set_server_tree(newer.clone());

    sync.document().apply(theme("winter")).unwrap();

    let outcome = sync.poll_tick().await.unwrap();
    assert!(matches!(outcome, CheckOutcome::Replaced { .. }));
    assert_eq!(sync.document().snapshot(), newer);
    assert!(!sync.document().has_unsaved_change());

    assert_eq!(sync.auto_save_tick().await, AutoSaveOutcome::Clean);
    assert_eq!(remote.server_tree(), newer);
}

#[tokio::test(start_paused = true)]
async fn test_reload_discards_local_edits() {
    let remote = Arc::new(MockRemote::new(fixtures::sample_tree()));
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);

    let mut server = fixtures::sample_tree();
    server.version = 9;
    server.attributes.theme_id = Some("autumn".to_string());
    remote.set_server_tree(server.clone());

    sync.document().apply(theme("winter")).unwrap();

    let outcome = sync.reload().await.unwrap();
    assert!(matches!(outcome, CheckOutcome::Replaced { to, .. } if to.version == 9));
    assert_eq!(sync.document().snapshot(), server);
    assert!(!sync.document().lock().can_undo());
    assert_eq!(remote.check_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_status_is_published() {
    let remote = Arc::new(MockRemote::new(fixtures::sample_tree()));
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);
    let mut status = sync.subscribe();

    sync.document().apply(theme("winter")).unwrap();
    sync.force_save().await.unwrap();

    assert!(status.has_changed().unwrap());
    let current = status.borrow_and_update().clone();
    assert_eq!(current.last_saved.map(|marker| marker.version), Some(6));
    assert!(!current.saving);
    assert!(!current.checking);
    assert!(!current.terminated);
}

#[tokio::test(start_paused = true)]
async fn test_missing_token_terminates_once() {
    let remote = Arc::new(MockRemote::new(fixtures::sample_tree()));
    let auth = Arc::new(MockAuth::signed_out());
    let sync = coordinator(&remote, &auth);

    let err = sync.force_check().await.unwrap_err();
    assert!(err.is_auth());
    assert_eq!(sync.force_check().await, Err(SyncError::Terminated));
    assert_eq!(
        sync.poll_tick().await,
        Ok(CheckOutcome::Skipped(SkipReason::Inactive))
    );

    assert_eq!(auth.logouts(), 1);
    assert_eq!(remote.check_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_auto_save_loop_persists_after_one_period() {
    let remote = Arc::new(MockRemote::new(fixtures::sample_tree()));
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);
    let handle = sync.start();

    sync.document().apply(theme("winter")).unwrap();

    time::sleep(Duration::from_secs(89)).await;
    assert_eq!(remote.persist_calls(), 0);

    // The 90s tick may lose the gate to the poll firing at the same instant
    time::sleep(Duration::from_secs(92)).await;
    assert_eq!(remote.persist_calls(), 1);
    assert!(!sync.document().has_unsaved_change());
    assert!(remote.check_calls() >= 5);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_auth_failure_stops_loops_and_logs_out_once() {
    let remote = Arc::new(MockRemote::new(fixtures::sample_tree()));
    let auth = Arc::new(MockAuth::signed_in());
    let sync = coordinator(&remote, &auth);
    remote.fail_persist(RemoteError::Unauthorized("token expired".to_string()));

    let handle = sync.start();
    sync.document().apply(theme("winter")).unwrap();

    time::sleep(Duration::from_secs(300)).await;

    assert!(sync.is_terminated());
    assert!(!handle.is_running());
    assert!(sync.status().terminated);
    assert_eq!(auth.logouts(), 1);
    assert_eq!(auth.last_reason().as_deref(), Some("token expired"));
    assert_eq!(remote.persist_calls(), 1);

    // The edit is kept and nothing runs any more
    assert!(sync.document().has_unsaved_change());
    let checks = remote.check_calls();
    time::sleep(Duration::from_secs(300)).await;
    assert_eq!(remote.check_calls(), checks);
    assert_eq!(sync.force_save().await, Err(SyncError::Terminated));
}
