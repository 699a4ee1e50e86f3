use storage::repository::{
    CompletionRepository, GroupRepository, NewCompletionRecord, NewGroupRecord,
    NewParticipantRecord, ParticipantRepository, StorageError,
};
use storage::sqlite::SqliteRepository;
use tracker_core::model::{CompletionKey, GroupId, Participant, Round, Unit};
use tracker_core::time::fixed_now;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn new_group(slug: &str) -> NewGroupRecord {
    NewGroupRecord {
        slug: slug.to_owned(),
        name: format!("{slug} group"),
        created_at: fixed_now(),
    }
}

fn new_participant(group_id: GroupId, name: &str, order_index: u32) -> NewParticipantRecord {
    NewParticipantRecord {
        group_id,
        name: name.to_owned(),
        order_index,
        streak: 0,
        created_at: fixed_now(),
    }
}

fn key(unit: u8, round: u32) -> CompletionKey {
    CompletionKey::new(Unit::new(unit).unwrap(), Round::new(round).unwrap())
}

#[tokio::test]
async fn sqlite_roundtrips_group_and_participants() {
    let repo = connect("memdb_roundtrip").await;

    let group_id = repo.insert_new_group(new_group("khan")).await.unwrap();
    let group = repo.get_group(group_id).await.unwrap().unwrap();
    assert_eq!(group.slug(), "khan");
    assert_eq!(group.name(), "khan group");

    repo.insert_new_participant(new_participant(group_id, "Bilal", 1))
        .await
        .unwrap();
    repo.insert_new_participant(new_participant(group_id, "Amina", 0))
        .await
        .unwrap();

    let listed = repo.list_participants(group_id).await.unwrap();
    let names: Vec<&str> = listed.iter().map(Participant::name).collect();
    assert_eq!(names, ["Amina", "Bilal"]);
    assert_eq!(repo.count_participants(group_id).await.unwrap(), 2);
}

#[tokio::test]
async fn sqlite_rejects_duplicate_slug_as_conflict() {
    let repo = connect("memdb_slug_conflict").await;

    repo.insert_new_group(new_group("khan")).await.unwrap();
    let err = repo.insert_new_group(new_group("khan")).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn sqlite_upsert_participant_renames_and_updates_streak() {
    let repo = connect("memdb_upsert").await;

    let group_id = repo.insert_new_group(new_group("khan")).await.unwrap();
    let pid = repo
        .insert_new_participant(new_participant(group_id, "Amina", 0))
        .await
        .unwrap();

    let stored = repo.get_participant(pid).await.unwrap().unwrap();
    let updated = stored.renamed("Aminah").unwrap().with_streak(4);
    repo.upsert_participant(&updated).await.unwrap();

    let refreshed = repo.get_participant(pid).await.unwrap().unwrap();
    assert_eq!(refreshed.name(), "Aminah");
    assert_eq!(refreshed.streak(), 4);
    assert_eq!(refreshed.order_index(), 0);
}

#[tokio::test]
async fn sqlite_completion_inserts_are_idempotent() {
    let repo = connect("memdb_idempotent").await;

    let group_id = repo.insert_new_group(new_group("khan")).await.unwrap();
    let pid = repo
        .insert_new_participant(new_participant(group_id, "Amina", 0))
        .await
        .unwrap();

    let record = NewCompletionRecord {
        participant_id: pid,
        key: key(7, 1),
        completed_at: fixed_now(),
    };
    repo.insert_completion(record.clone()).await.unwrap();
    repo.insert_completion(record).await.unwrap();

    let records = repo.list_completions(group_id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].participant_id(), pid);
    assert_eq!(records[0].key(), key(7, 1));
}

#[tokio::test]
async fn sqlite_delete_completion_is_a_hard_delete() {
    let repo = connect("memdb_toggle").await;

    let group_id = repo.insert_new_group(new_group("khan")).await.unwrap();
    let pid = repo
        .insert_new_participant(new_participant(group_id, "Amina", 0))
        .await
        .unwrap();

    repo.insert_completion(NewCompletionRecord {
        participant_id: pid,
        key: key(3, 2),
        completed_at: fixed_now(),
    })
    .await
    .unwrap();

    repo.delete_completion(pid, key(3, 2)).await.unwrap();
    assert!(repo.list_completions(group_id).await.unwrap().is_empty());

    // Deleting again is a no-op.
    repo.delete_completion(pid, key(3, 2)).await.unwrap();
}

#[tokio::test]
async fn sqlite_group_delete_cascades_to_completions() {
    let repo = connect("memdb_cascade").await;

    let group_id = repo.insert_new_group(new_group("khan")).await.unwrap();
    let pid = repo
        .insert_new_participant(new_participant(group_id, "Amina", 0))
        .await
        .unwrap();
    repo.insert_completion(NewCompletionRecord {
        participant_id: pid,
        key: key(1, 1),
        completed_at: fixed_now(),
    })
    .await
    .unwrap();

    repo.delete_group(group_id).await.unwrap();

    assert!(repo.get_group(group_id).await.unwrap().is_none());
    assert!(repo.get_participant(pid).await.unwrap().is_none());
    assert!(repo.list_completions(group_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_completions_scope_to_the_requested_group() {
    let repo = connect("memdb_scoping").await;

    let khan = repo.insert_new_group(new_group("khan")).await.unwrap();
    let smith = repo.insert_new_group(new_group("smith")).await.unwrap();
    let khan_pid = repo
        .insert_new_participant(new_participant(khan, "Amina", 0))
        .await
        .unwrap();
    let smith_pid = repo
        .insert_new_participant(new_participant(smith, "Sam", 0))
        .await
        .unwrap();

    for (pid, unit) in [(khan_pid, 1), (smith_pid, 2)] {
        repo.insert_completion(NewCompletionRecord {
            participant_id: pid,
            key: key(unit, 1),
            completed_at: fixed_now(),
        })
        .await
        .unwrap();
    }

    let khan_records = repo.list_completions(khan).await.unwrap();
    assert_eq!(khan_records.len(), 1);
    assert_eq!(khan_records[0].participant_id(), khan_pid);

    let unknown = repo.list_completions(GroupId::new(999)).await.unwrap();
    assert!(unknown.is_empty());
}
