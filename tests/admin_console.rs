//! Integration tests for the admin console flows: user management, join
//! review, rooms, deposit approval, dashboard counters.

use bgmi_tournament_api::{
    auth, register_with_otp, request_otp, DashboardStats, DepositStatus, Device, Error,
    JoinStatus, Storage,
};

fn storage() -> Storage {
    Storage::open_in_memory().expect("in-memory storage")
}

fn register(s: &Storage, email: &str, name: &str) {
    let otp = request_otp(s, email).unwrap();
    register_with_otp(s, email, &otp.code, name, "pw").unwrap();
}

#[test]
fn user_listing_and_delete() {
    let s = storage();
    register(&s, "a@example.com", "Alpha");
    register(&s, "b@example.com", "Bravo");

    let users = s.list_users().unwrap();
    assert_eq!(users.len(), 2);
    // Newest first, and the two generated profile ids differ
    assert_eq!(users[0].name, "Bravo");
    assert_ne!(users[0].profile_id, users[1].profile_id);

    assert!(s.delete_user(users[1].id).unwrap());
    let users = s.list_users().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "Bravo");
}

#[test]
fn join_review_queue() {
    let s = storage();
    let a = s
        .create_join("ShadowHunter", "5123456789", Device::Android, "TDM-01")
        .unwrap();
    let b = s
        .create_join("SniperKing", "5876543210", Device::Ios, "TDM-02")
        .unwrap();

    s.set_join_status(a.id, JoinStatus::Confirmed).unwrap();
    s.set_join_status(b.id, JoinStatus::Rejected).unwrap();

    let joins = s.list_joins().unwrap();
    assert_eq!(joins.len(), 2);
    assert_eq!(joins[0].status, JoinStatus::Rejected); // newest first
    assert_eq!(joins[1].status, JoinStatus::Confirmed);

    assert!(s.delete_join(b.id).unwrap());
    assert_eq!(s.list_joins().unwrap().len(), 1);
}

#[test]
fn room_publishing() {
    let s = storage();
    s.create_room("784512", "tiger", "1v1 TDM", "Warehouse", "2025-12-22T08:50")
        .unwrap();
    s.create_room("900013", "eagle", "Custom Classic", "Erangel", "2025-12-23T20:00")
        .unwrap();

    let rooms = s.list_rooms().unwrap();
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0].room_id, "900013");
    // Start time comes back exactly as the console sent it
    assert_eq!(rooms[1].starts_at, "2025-12-22T08:50");
}

#[test]
fn deposit_approval_queue() {
    let s = storage();
    let d1 = s
        .create_deposit("Alpha", "BGMI-100001", "a@example.com", 500, "UTR-A")
        .unwrap();
    let d2 = s
        .create_deposit("Bravo", "BGMI-100002", "b@example.com", 250, "UTR-B")
        .unwrap();
    s.create_deposit("Charlie", "BGMI-100003", "c@example.com", 750, "UTR-C")
        .unwrap();

    s.set_deposit_status(d1.id, DepositStatus::Approved).unwrap();
    s.set_deposit_status(d2.id, DepositStatus::Rejected).unwrap();

    let deposits = s.list_deposits().unwrap();
    assert_eq!(deposits.len(), 3);
    assert_eq!(deposits[0].status, DepositStatus::Pending);
    assert_eq!(deposits[1].status, DepositStatus::Rejected);
    assert_eq!(deposits[2].status, DepositStatus::Approved);

    // A settled deposit cannot be flipped
    let err = s
        .set_deposit_status(d2.id, DepositStatus::Approved)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
}

#[test]
fn dashboard_counters() {
    let s = storage();
    register(&s, "a@example.com", "Alpha");
    s.create_room("784512", "tiger", "1v1 TDM", "Livik", "2025-12-22T08:50")
        .unwrap();
    s.create_join("Alpha", "5123456789", Device::Android, "TDM-01")
        .unwrap();
    let d = s
        .create_deposit("Alpha", "BGMI-100001", "a@example.com", 100, "UTR-1")
        .unwrap();
    s.create_deposit("Alpha", "BGMI-100001", "a@example.com", 200, "UTR-2")
        .unwrap();
    s.set_deposit_status(d.id, DepositStatus::Approved).unwrap();

    assert_eq!(
        s.stats().unwrap(),
        DashboardStats {
            users: 1,
            rooms: 1,
            joins: 1,
            pending_deposits: 1,
        }
    );
}

#[test]
fn admin_token_separates_roles() {
    let secret = "console-secret";
    let admin = auth::sign_admin_token(secret, "admin@bgmi.com").unwrap();
    let player = auth::sign_player_token(secret, "p@example.com").unwrap();

    let claims = auth::verify_token(secret, &admin).unwrap();
    assert_eq!(claims.role, auth::Role::Admin);

    let claims = auth::verify_token(secret, &player).unwrap();
    assert_eq!(claims.role, auth::Role::Player);

    assert!(auth::verify_token("other-secret", &admin).is_err());
}
