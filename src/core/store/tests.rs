use super::*;
use chrono::{TimeZone, Utc};
use tempfile::tempdir;

use crate::core::entity::Gender;
use crate::entities::survey::{LoanPurpose, SchoolStatus};
use crate::entities::{
    AnnualChildrenStatus, AnnualData, ChildEntry, Cluster, Meeting, Member, SelfHelpGroup,
    SixMonthData, Sponsor, Staff, StaffRole,
};

fn seed_cluster(store: &Store, name: &str) -> Cluster {
    let cluster = Cluster::new(name);
    store.insert_cluster(&cluster).unwrap();
    cluster
}

fn seed_group(store: &Store, sponsor: Sponsor, name: &str) -> SelfHelpGroup {
    let group = SelfHelpGroup::new(name, sponsor);
    store.insert_group(&group).unwrap();
    group
}

fn seed_member(store: &Store, group: &SelfHelpGroup, first: &str) -> Member {
    let member = Member::new(group.id.clone(), first, "Test", Gender::Female, 30);
    store.insert_member(&member).unwrap();
    member
}

#[test]
fn test_open_file_backed_store() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join(".shg/ledger.db");
    {
        let store = Store::open(&path).unwrap();
        seed_cluster(&store, "Adama");
    }
    let reopened = Store::open(&path).unwrap();
    assert_eq!(reopened.list_clusters(&ClusterFilter::default()).unwrap().len(), 1);
    assert_eq!(reopened.path(), Some(path.as_path()));
}

#[test]
fn test_short_ids_are_sequential_per_prefix() {
    let store = Store::open_in_memory().unwrap();
    let a = Cluster::new("A");
    let b = Cluster::new("B");
    assert_eq!(store.insert_cluster(&a).unwrap(), "CLU@1");
    assert_eq!(store.insert_cluster(&b).unwrap(), "CLU@2");
    assert_eq!(store.ensure_short_id(&a.id).unwrap(), "CLU@1");

    let staff = Staff::new("Abebe", StaffRole::Facilitator);
    assert_eq!(store.insert_staff(&staff).unwrap(), "STF@1");

    assert_eq!(store.resolve_short_id("clu@2"), Some(b.id.clone()));
    assert_eq!(store.resolve_id("CLU@1", EntityPrefix::Clu).unwrap(), a.id);
    assert_eq!(
        store.resolve_id(&b.id.to_string(), EntityPrefix::Clu).unwrap(),
        b.id
    );
}

#[test]
fn test_resolve_id_errors() {
    let store = Store::open_in_memory().unwrap();
    seed_cluster(&store, "A");

    let missing = store.resolve_id("CLU@9", EntityPrefix::Clu).unwrap_err();
    assert!(matches!(missing, ShgError::NotFound(_)));

    let wrong = store.resolve_id("CLU@1", EntityPrefix::Shg).unwrap_err();
    assert!(matches!(wrong, ShgError::Validation(_)));

    let garbage = store.resolve_id("not-an-id", EntityPrefix::Shg).unwrap_err();
    assert!(matches!(garbage, ShgError::Validation(_)));
}

#[test]
fn test_group_requires_existing_sponsor() {
    let store = Store::open_in_memory().unwrap();
    let group = SelfHelpGroup::new(
        "Orphan",
        Sponsor::Cluster(EntityId::new(EntityPrefix::Clu)),
    );
    let err = store.insert_group(&group).unwrap_err();
    assert!(matches!(err, ShgError::NotFound(_)));
    assert!(err.to_string().starts_with("Cluster not found"));
}

#[test]
fn test_schema_rejects_group_with_two_sponsors() {
    let store = Store::open_in_memory().unwrap();
    let cluster = seed_cluster(&store, "A");
    let staff = Staff::new("F", StaffRole::Facilitator);
    store.insert_staff(&staff).unwrap();

    let result = store.conn().execute(
        "INSERT INTO shg_groups (id, name, cluster_id, facilitator_id, status, created_at, updated_at)
         VALUES ('SHG-01HQ3K4N5M6P7R8S9T0VWXYZAB', 'Both', ?1, ?2, 'active', 'x', 'x')",
        params![cluster.id, staff.id],
    );
    assert!(result.is_err());
}

#[test]
fn test_counters_are_derived() {
    let store = Store::open_in_memory().unwrap();
    let cluster = seed_cluster(&store, "A");
    let g1 = seed_group(&store, Sponsor::Cluster(cluster.id.clone()), "G1");
    let g2 = seed_group(&store, Sponsor::Cluster(cluster.id.clone()), "G2");
    seed_member(&store, &g1, "M1");
    seed_member(&store, &g1, "M2");
    seed_member(&store, &g2, "M3");

    let overview = store.cluster_overview(&cluster.id).unwrap();
    assert_eq!(overview.total_groups, 2);
    assert_eq!(overview.total_members, 3);

    let groups = store.list_groups(&GroupFilter::default()).unwrap();
    let counts: Vec<i64> = groups.iter().map(|g| g.total_members).collect();
    assert_eq!(counts.iter().sum::<i64>(), 3);
    assert_eq!(store.group_overview(&g1.id).unwrap().total_members, 2);
}

#[test]
fn test_cluster_delete_cascades() {
    let mut store = Store::open_in_memory().unwrap();
    let cluster = seed_cluster(&store, "A");
    let group = seed_group(&store, Sponsor::Cluster(cluster.id.clone()), "G1");
    let member = seed_member(&store, &group, "M1");
    store
        .insert_six_month(&SixMonthData::new(member.id.clone(), LoanPurpose::Iga))
        .unwrap();

    store.delete_cluster(&cluster.id).unwrap();

    assert!(matches!(
        store.get_group(&group.id).unwrap_err(),
        ShgError::NotFound(_)
    ));
    assert!(!store.exists(&member.id).unwrap());
    assert!(store.list_six_month(&SurveyFilter::default()).unwrap().is_empty());
    assert!(store.resolve_short_id("CLU@1").is_none());
    assert!(store.resolve_short_id("SHG@1").is_none());
    assert!(store.resolve_short_id("MEM@1").is_none());
    assert!(store.resolve_short_id("SIX@1").is_none());
}

#[test]
fn test_staff_delete_rules() {
    let mut store = Store::open_in_memory().unwrap();
    let facilitator = Staff::new("F", StaffRole::Facilitator);
    let manager = Staff::new("M", StaffRole::ClusterManager);
    store.insert_staff(&facilitator).unwrap();
    store.insert_staff(&manager).unwrap();

    let mut cluster = Cluster::new("A");
    cluster.manager = Some(manager.id.clone());
    store.insert_cluster(&cluster).unwrap();
    seed_group(&store, Sponsor::Facilitator(facilitator.id.clone()), "G1");

    let err = store.delete_staff(&facilitator.id).unwrap_err();
    assert!(matches!(err, ShgError::Validation(_)));

    store.delete_staff(&manager.id).unwrap();
    assert!(store.get_cluster(&cluster.id).unwrap().manager.is_none());
}

#[test]
fn test_transfer_groups_from_facilitator() {
    let mut store = Store::open_in_memory().unwrap();
    let facilitator = Staff::new("F", StaffRole::Facilitator);
    store.insert_staff(&facilitator).unwrap();
    let target = seed_cluster(&store, "Target");
    let source = Sponsor::Facilitator(facilitator.id.clone());
    seed_group(&store, source.clone(), "G1");
    seed_group(&store, source.clone(), "G2");

    let moved = store.transfer_groups(&source, &target.id).unwrap();
    assert_eq!(moved, 2);

    let left = store
        .list_groups(&GroupFilter {
            facilitator: Some(facilitator.id.clone()),
            ..Default::default()
        })
        .unwrap();
    assert!(left.is_empty());

    let gained = store
        .list_groups(&GroupFilter {
            cluster: Some(target.id.clone()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(gained.len(), 2);
    assert!(gained
        .iter()
        .all(|g| g.group.sponsor == Sponsor::Cluster(target.id.clone())));
}

#[test]
fn test_transfer_groups_errors() {
    let mut store = Store::open_in_memory().unwrap();
    let source_cluster = seed_cluster(&store, "Empty");
    let target = seed_cluster(&store, "Target");

    let err = store
        .transfer_groups(
            &Sponsor::Cluster(source_cluster.id.clone()),
            &EntityId::new(EntityPrefix::Clu),
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "Target cluster not found.");

    let err = store
        .transfer_groups(&Sponsor::Cluster(source_cluster.id.clone()), &target.id)
        .unwrap_err();
    assert_eq!(err.to_string(), "No groups found for the specified source.");
    assert!(matches!(err, ShgError::NotFound(_)));
}

#[test]
fn test_group_and_member_filters() {
    let store = Store::open_in_memory().unwrap();
    let cluster = seed_cluster(&store, "A");
    let mut g1 = SelfHelpGroup::new("Tesfa", Sponsor::Cluster(cluster.id.clone()));
    g1.location = Some("Kebele 04".to_string());
    store.insert_group(&g1).unwrap();
    let g2 = seed_group(&store, Sponsor::Cluster(cluster.id.clone()), "Andinet");
    seed_member(&store, &g1, "Hiwot");
    let mut male = Member::new(g2.id.clone(), "Kebede", "Alemu", Gender::Male, 41);
    male.household_size = Some(6);
    store.insert_member(&male).unwrap();

    let by_location = store
        .list_groups(&GroupFilter {
            location: Some("Kebele 04".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(by_location.len(), 1);

    let by_name = store
        .list_groups(&GroupFilter {
            search: Some("andi".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(by_name[0].group.id, g2.id);

    let men = store
        .list_members(&MemberFilter {
            gender: Some(Gender::Male),
            cluster: Some(cluster.id.clone()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(men.len(), 1);
    assert_eq!(men[0].household_size, Some(6));

    assert_eq!(store.distinct_locations().unwrap(), vec!["Kebele 04"]);
}

#[test]
fn test_update_member_and_group() {
    let store = Store::open_in_memory().unwrap();
    let cluster = seed_cluster(&store, "A");
    let mut group = seed_group(&store, Sponsor::Cluster(cluster.id.clone()), "G1");
    let mut member = seed_member(&store, &group, "Hiwot");

    group.region = Some("Oromia".to_string());
    store.update_group(&mut group).unwrap();
    assert_eq!(
        store.get_group(&group.id).unwrap().region.as_deref(),
        Some("Oromia")
    );

    member.age = 35;
    member.other_shg_members = Some(1);
    let err = store.update_member(&mut member).unwrap_err();
    assert!(matches!(err, ShgError::Validation(_)));

    member.other_shg_member_in_house = true;
    store.update_member(&mut member).unwrap();
    assert_eq!(store.get_member(&member.id).unwrap().age, 35);
}

#[test]
fn test_children_status_roundtrip() {
    let mut store = Store::open_in_memory().unwrap();
    let cluster = seed_cluster(&store, "A");
    let group = seed_group(&store, Sponsor::Cluster(cluster.id.clone()), "G1");
    let member = seed_member(&store, &group, "Hiwot");

    let mut rec = AnnualChildrenStatus::new(member.id.clone(), 2);
    rec.children = vec![
        ChildEntry {
            name: Some("Abel".to_string()),
            gender: Some(Gender::Male),
            age: Some(9),
            school_status: Some(SchoolStatus::Enrolled),
        },
        ChildEntry {
            name: Some("Sara".to_string()),
            gender: Some(Gender::Female),
            age: Some(15),
            school_status: Some(SchoolStatus::DroppedOut),
        },
    ];
    store.insert_children_status(&rec).unwrap();

    let stored = store
        .list_children_status(&SurveyFilter {
            member: Some(member.id.clone()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].children, rec.children);
}

#[test]
fn test_annual_requires_member() {
    let store = Store::open_in_memory().unwrap();
    let rec = AnnualData::new(EntityId::new(EntityPrefix::Mem), 30, Gender::Female);
    let err = store.insert_annual(&rec).unwrap_err();
    assert!(matches!(err, ShgError::NotFound(_)));
}

#[test]
fn test_attendance_upsert_and_sheet() {
    let store = Store::open_in_memory().unwrap();
    let cluster = seed_cluster(&store, "A");
    let group = seed_group(&store, Sponsor::Cluster(cluster.id.clone()), "G1");
    let present = seed_member(&store, &group, "Present");
    let absent = seed_member(&store, &group, "Absent");

    let when = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    let meeting = Meeting::new(group.id.clone(), "Savings review", when);
    store.insert_meeting(&meeting).unwrap();

    store.record_attendance(&meeting.id, &present.id, false).unwrap();
    let first = store.record_attendance(&meeting.id, &present.id, true).unwrap();
    assert!(first.attended);
    store.record_attendance(&meeting.id, &absent.id, false).unwrap();

    let sheet = store.attendance_sheet(&meeting.id).unwrap();
    assert_eq!(sheet.attended.len(), 1);
    assert_eq!(sheet.attended[0].id, present.id);
    assert_eq!(sheet.missed.len(), 1);
    assert_eq!(sheet.missed[0].id, absent.id);

    let err = store
        .attendance_sheet(&EntityId::new(EntityPrefix::Mtg))
        .unwrap_err();
    assert_eq!(err.to_string(), "Meeting not found");
}

#[test]
fn test_attendance_requires_group_membership() {
    let store = Store::open_in_memory().unwrap();
    let cluster = seed_cluster(&store, "A");
    let g1 = seed_group(&store, Sponsor::Cluster(cluster.id.clone()), "G1");
    let g2 = seed_group(&store, Sponsor::Cluster(cluster.id.clone()), "G2");
    let outsider = seed_member(&store, &g2, "Outsider");

    let meeting = Meeting::new(g1.id.clone(), "Agenda", Utc::now());
    store.insert_meeting(&meeting).unwrap();

    let err = store
        .record_attendance(&meeting.id, &outsider.id, true)
        .unwrap_err();
    assert!(matches!(err, ShgError::Validation(_)));
}

#[test]
fn test_group_delete_cascades_meetings() {
    let mut store = Store::open_in_memory().unwrap();
    let cluster = seed_cluster(&store, "A");
    let group = seed_group(&store, Sponsor::Cluster(cluster.id.clone()), "G1");
    let member = seed_member(&store, &group, "M");
    let meeting = Meeting::new(group.id.clone(), "Agenda", Utc::now());
    store.insert_meeting(&meeting).unwrap();
    store.record_attendance(&meeting.id, &member.id, true).unwrap();

    store.delete_group(&group.id).unwrap();
    assert!(store.list_meetings(None, None).unwrap().is_empty());
    let rows: i64 = store
        .conn()
        .query_row("SELECT COUNT(*) FROM attendance", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn test_group_delete_forgets_cascaded_short_ids() {
    let mut store = Store::open_in_memory().unwrap();
    let cluster = seed_cluster(&store, "A");
    let doomed = seed_group(&store, Sponsor::Cluster(cluster.id.clone()), "G1");
    let kept = seed_group(&store, Sponsor::Cluster(cluster.id.clone()), "G2");
    let member = seed_member(&store, &doomed, "M1");
    let survivor = seed_member(&store, &kept, "M2");
    store
        .insert_annual(&AnnualData::new(member.id.clone(), 30, Gender::Female))
        .unwrap();
    let meeting = Meeting::new(doomed.id.clone(), "Agenda", Utc::now());
    store.insert_meeting(&meeting).unwrap();

    store.delete_group(&doomed.id).unwrap();

    let err = store.resolve_id("MEM@1", EntityPrefix::Mem).unwrap_err();
    assert!(matches!(err, ShgError::NotFound(_)));
    assert!(store.resolve_short_id("ANN@1").is_none());
    assert!(store.resolve_short_id("MTG@1").is_none());
    assert_eq!(store.resolve_short_id("MEM@2"), Some(survivor.id.clone()));
    assert_eq!(store.resolve_short_id("SHG@2"), Some(kept.id.clone()));

    let orphans: i64 = store
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM short_ids WHERE entity_id IN (?1, ?2, ?3)",
            rusqlite::params![member.id, doomed.id, meeting.id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphans, 0);

    // numbers are not reused
    let next = seed_member(&store, &kept, "M3");
    assert_eq!(store.short_id(&next.id).as_deref(), Some("MEM@3"));
}
