//! End-to-end tests of the match core against a real SQLite file.

use std::sync::{Arc, Barrier};
use std::thread;

use cupid_core::{
    Accounts, ConversationManager, Discovery, MatchRegistry, MessageStore, Moderation,
    SwipeEngine,
};
use cupid_shared::models::{ReportReason, ReportStatus};
use cupid_shared::{CoreError, SwipeDirection, UserId};
use cupid_store::Database;

fn open() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join("cupid.db")).unwrap();
    (dir, db)
}

fn users(db: &Database, names: &[&str]) -> Vec<UserId> {
    names
        .iter()
        .map(|n| db.create_user(n, None).unwrap().id)
        .collect()
}

fn mutual_match(db: &Database, a: UserId, b: UserId) {
    let swipes = SwipeEngine::new(db);
    assert!(!swipes.record_swipe(a, b, SwipeDirection::Right).unwrap().matched);
    assert!(swipes.record_swipe(b, a, SwipeDirection::Right).unwrap().matched);
}

#[test]
fn swipe_match_chat_and_read() {
    let (_dir, db) = open();
    let ids = users(&db, &["Ada", "Bo"]);
    let (a, b) = (ids[0], ids[1]);

    mutual_match(&db, a, b);
    assert!(MatchRegistry::new(&db).is_matched(b, a).unwrap());

    let conv = ConversationManager::new(&db).start_conversation(a, b).unwrap();

    let store = MessageStore::new(&db);
    let sent = store.send_message(conv, a, "  hi  ").unwrap();
    assert_eq!(sent.text, "hi");
    assert_eq!(sent.sender_name, "Ada");
    assert_eq!(sent.receiver_id, b);

    let inbox = store.list_conversations(b).unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].unread_count, 1);
    assert_eq!(inbox[0].last_message.as_deref(), Some("hi"));
    assert_eq!(inbox[0].last_message_time, Some(sent.created_at));

    // The sender never counts their own messages as unread.
    assert_eq!(store.list_conversations(a).unwrap()[0].unread_count, 0);

    assert_eq!(store.mark_read(conv, b).unwrap(), 1);
    assert_eq!(store.list_conversations(b).unwrap()[0].unread_count, 0);

    let for_b = store.list_messages(conv, b).unwrap();
    assert_eq!(for_b.len(), 1);
    assert!(!for_b[0].is_me);
    assert!(store.list_messages(conv, a).unwrap()[0].is_me);
}

#[test]
fn left_swipes_never_match() {
    let (_dir, db) = open();
    let ids = users(&db, &["A", "B"]);
    let swipes = SwipeEngine::new(&db);

    swipes.record_swipe(ids[0], ids[1], SwipeDirection::Right).unwrap();
    let outcome = swipes
        .record_swipe(ids[1], ids[0], SwipeDirection::Left)
        .unwrap();
    assert!(!outcome.matched);
    assert!(!MatchRegistry::new(&db).is_matched(ids[0], ids[1]).unwrap());

    // Changing one's mind to right completes the match.
    assert!(swipes
        .record_swipe(ids[1], ids[0], SwipeDirection::Right)
        .unwrap()
        .matched);
}

#[test]
fn left_swipe_after_match_keeps_the_match() {
    let (_dir, db) = open();
    let ids = users(&db, &["Ada", "Bo"]);
    let (a, b) = (ids[0], ids[1]);

    mutual_match(&db, a, b);
    let conv = ConversationManager::new(&db).start_conversation(a, b).unwrap();

    let outcome = SwipeEngine::new(&db)
        .record_swipe(a, b, SwipeDirection::Left)
        .unwrap();
    assert!(!outcome.matched);
    assert!(MatchRegistry::new(&db).is_matched(a, b).unwrap());
    assert_eq!(MatchRegistry::new(&db).list_matches(b).unwrap().len(), 1);

    let sent = MessageStore::new(&db).send_message(conv, b, "still here?").unwrap();
    assert_eq!(sent.receiver_id, a);
}

#[test]
fn swipe_validation() {
    let (_dir, db) = open();
    let ids = users(&db, &["A"]);
    let swipes = SwipeEngine::new(&db);

    assert!(matches!(
        swipes.record_swipe(ids[0], ids[0], SwipeDirection::Right),
        Err(CoreError::InvalidInput(_))
    ));
    assert!(matches!(
        swipes.record_swipe(ids[0], UserId(9999), SwipeDirection::Right),
        Err(CoreError::NotFound(_))
    ));
}

#[test]
fn repeated_right_swipes_keep_one_match() {
    let (_dir, db) = open();
    let ids = users(&db, &["A", "B"]);
    mutual_match(&db, ids[0], ids[1]);

    let again = SwipeEngine::new(&db)
        .record_swipe(ids[0], ids[1], SwipeDirection::Right)
        .unwrap();
    assert!(again.matched);
    assert_eq!(MatchRegistry::new(&db).list_matches(ids[0]).unwrap().len(), 1);
}

#[test]
fn conversation_requires_match_and_is_unique() {
    let (_dir, db) = open();
    let ids = users(&db, &["A", "B"]);
    let manager = ConversationManager::new(&db);

    assert_eq!(
        manager.get_or_create_conversation(ids[0], ids[1]),
        Err(CoreError::NotMatched)
    );

    mutual_match(&db, ids[0], ids[1]);
    let first = manager.get_or_create_conversation(ids[0], ids[1]).unwrap();
    let second = manager.get_or_create_conversation(ids[1], ids[0]).unwrap();
    assert_eq!(first, second);

    let conv = db.find_conversation(first).unwrap().unwrap();
    assert_eq!((conv.user1_id, conv.user2_id), (ids[0], ids[1]));
}

#[test]
fn outsiders_cannot_read_or_write() {
    let (_dir, db) = open();
    let ids = users(&db, &["A", "B", "Eve"]);
    mutual_match(&db, ids[0], ids[1]);
    let conv = ConversationManager::new(&db)
        .start_conversation(ids[0], ids[1])
        .unwrap();

    let store = MessageStore::new(&db);
    assert!(matches!(
        store.send_message(conv, ids[2], "hello"),
        Err(CoreError::Unauthorized(_))
    ));
    assert!(matches!(
        store.list_messages(conv, ids[2]),
        Err(CoreError::Unauthorized(_))
    ));
    assert!(matches!(
        store.mark_read(conv, ids[2]),
        Err(CoreError::Unauthorized(_))
    ));
    assert!(matches!(
        store.list_messages(cupid_shared::ConversationId(404), ids[0]),
        Err(CoreError::NotFound(_))
    ));
}

#[test]
fn message_text_limits() {
    let (_dir, db) = open();
    let ids = users(&db, &["A", "B"]);
    mutual_match(&db, ids[0], ids[1]);
    let conv = ConversationManager::new(&db)
        .start_conversation(ids[0], ids[1])
        .unwrap();

    let store = MessageStore::new(&db).with_max_len(5);
    assert!(matches!(
        store.send_message(conv, ids[0], "   "),
        Err(CoreError::InvalidInput(_))
    ));
    assert!(matches!(
        store.send_message(conv, ids[0], "too long"),
        Err(CoreError::InvalidInput(_))
    ));
    assert!(store.send_message(conv, ids[0], "short").is_ok());
}

#[test]
fn block_removes_match_and_stops_messages() {
    let (_dir, db) = open();
    let ids = users(&db, &["A", "B"]);
    let (a, b) = (ids[0], ids[1]);
    mutual_match(&db, a, b);
    let conv = ConversationManager::new(&db).start_conversation(a, b).unwrap();
    let store = MessageStore::new(&db);
    store.send_message(conv, a, "before").unwrap();

    let moderation = Moderation::new(&db);
    moderation.block_user(b, a, Some("  no thanks ")).unwrap();
    assert!(moderation.is_blocked(b, a).unwrap());
    assert!(!MatchRegistry::new(&db).is_matched(a, b).unwrap());

    // History survives, new messages do not.
    assert_eq!(store.list_messages(conv, a).unwrap().len(), 1);
    assert_eq!(store.send_message(conv, a, "after"), Err(CoreError::NotMatched));

    // A fresh mutual swipe is suppressed while the block stands.
    let swipes = SwipeEngine::new(&db);
    swipes.record_swipe(a, b, SwipeDirection::Right).unwrap();
    assert!(!swipes.record_swipe(b, a, SwipeDirection::Right).unwrap().matched);

    assert!(matches!(
        moderation.block_user(b, a, None),
        Err(CoreError::InvalidInput(_))
    ));
    let blocked = moderation.list_blocked(b).unwrap();
    assert_eq!(blocked[0].reason.as_deref(), Some("no thanks"));

    moderation.unblock_user(b, a).unwrap();
    assert!(matches!(
        moderation.unblock_user(b, a),
        Err(CoreError::NotFound(_))
    ));
    assert!(swipes.record_swipe(b, a, SwipeDirection::Right).unwrap().matched);
}

#[test]
fn reports_reject_duplicates_while_open() {
    let (_dir, db) = open();
    let ids = users(&db, &["A", "B"]);
    let moderation = Moderation::new(&db);

    assert!(matches!(
        moderation.report_user(ids[0], ids[0], ReportReason::Spam, None),
        Err(CoreError::InvalidInput(_))
    ));

    moderation
        .report_user(ids[0], ids[1], ReportReason::FakeProfile, Some("stock photo"))
        .unwrap();
    assert!(matches!(
        moderation.report_user(ids[0], ids[1], ReportReason::Spam, None),
        Err(CoreError::InvalidInput(_))
    ));

    let reports = moderation.list_reports(ids[0]).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].reason, ReportReason::FakeProfile);

    // Once dismissed, the same reporter may file again.
    moderation
        .review_report(reports[0].id, ReportStatus::Dismissed)
        .unwrap();
    assert!(moderation
        .report_user(ids[0], ids[1], ReportReason::Spam, None)
        .is_ok());
    assert!(matches!(
        moderation.review_report(9999, ReportStatus::Resolved),
        Err(CoreError::NotFound(_))
    ));
}

#[test]
fn nearby_filters_by_distance_and_state() {
    let (_dir, db) = open();
    let ids = users(&db, &["Viewer", "Near", "Far", "Paused"]);
    let discovery = Discovery::new(&db);

    // Paris, Versailles, New York, Paris.
    discovery.update_location(ids[0], 48.8566, 2.3522).unwrap();
    discovery.update_location(ids[1], 48.8049, 2.1204).unwrap();
    discovery.update_location(ids[2], 40.7128, -74.0060).unwrap();
    discovery.update_location(ids[3], 48.8566, 2.3522).unwrap();
    Accounts::new(&db).pause(ids[3]).unwrap();

    let nearby = discovery
        .nearby_users(ids[0], 48.8566, 2.3522, 100.0)
        .unwrap();
    assert_eq!(nearby.len(), 1);
    assert_eq!(nearby[0].user.id, ids[1]);
    assert!(nearby[0].distance_km > 10.0 && nearby[0].distance_km < 30.0);

    assert!(matches!(
        discovery.update_location(ids[0], 91.0, 0.0),
        Err(CoreError::InvalidInput(_))
    ));
    assert!(matches!(
        discovery.update_location(UserId(9999), 0.0, 0.0),
        Err(CoreError::NotFound(_))
    ));
}

#[test]
fn account_stats_and_pause() {
    let (_dir, db) = open();
    let ids = users(&db, &["A", "B"]);
    mutual_match(&db, ids[0], ids[1]);
    let conv = ConversationManager::new(&db)
        .start_conversation(ids[0], ids[1])
        .unwrap();
    MessageStore::new(&db).send_message(conv, ids[0], "one").unwrap();
    MessageStore::new(&db).send_message(conv, ids[0], "two").unwrap();

    let accounts = Accounts::new(&db);
    let stats = accounts.stats(ids[0]).unwrap();
    assert_eq!((stats.matches, stats.conversations, stats.messages_sent), (1, 1, 2));

    accounts.pause(ids[1]).unwrap();
    assert!(db.get_user(ids[1]).unwrap().account_paused);
    accounts.reactivate(ids[1]).unwrap();
    assert!(!db.get_user(ids[1]).unwrap().account_paused);
    assert!(matches!(
        accounts.pause(UserId(9999)),
        Err(CoreError::NotFound(_))
    ));
}

#[test]
fn concurrent_creation_converges() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cupid.db");
    let (a, b) = {
        let db = Database::open_at(&path).unwrap();
        let ids = users(&db, &["A", "B"]);
        (ids[0], ids[1])
    };

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [(a, b), (b, a)]
        .into_iter()
        .map(|(swiper, swipee)| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let db = Database::open_at(&path).unwrap();
                barrier.wait();
                SwipeEngine::new(&db)
                    .record_swipe(swiper, swipee, SwipeDirection::Right)
                    .unwrap();
                // Both swipes are stored before either side opens the chat.
                barrier.wait();
                ConversationManager::new(&db)
                    .get_or_create_conversation(swiper, swipee)
                    .unwrap()
            })
        })
        .collect();

    let ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ids[0], ids[1]);

    let db = Database::open_at(&path).unwrap();
    assert_eq!(MatchRegistry::new(&db).list_matches(a).unwrap().len(), 1);
}
