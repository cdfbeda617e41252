// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::{conn, FakeAuth};
use moneytracker::db::get_setting;
use moneytracker::error::TrackerError;
use moneytracker::session::{account_email, Screen, SessionChange, SessionShell};

fn signed_in(name: &str) -> SessionChange {
    SessionChange {
        display_name: Some(name.to_string()),
    }
}

fn signed_out() -> SessionChange {
    SessionChange { display_name: None }
}

#[test]
fn usernames_map_to_synthetic_addresses() {
    assert_eq!(account_email(" Mg Mg "), "mgmg@moneytracker.local");
    assert_eq!(account_email("ALICE"), "alice@moneytracker.local");
    assert_eq!(account_email("a\tb c"), "abc@moneytracker.local");
}

#[test]
fn sign_up_then_sign_in_reaches_dashboard() {
    let conn = conn();
    let auth = FakeAuth::default();
    let mut shell = SessionShell::start(&auth, &conn).unwrap();
    let rx = shell.subscribe();
    assert_eq!(rx.try_recv().unwrap(), signed_out());

    // no session issued until the account is confirmed
    assert_eq!(shell.sign_up("Mg Mg", "secret").unwrap(), Screen::Auth);
    assert!(rx.try_recv().is_err());
    assert!(auth.users.borrow().contains_key("mgmg@moneytracker.local"));

    let screen = shell.sign_in("mg mg", "secret").unwrap();
    assert_eq!(
        screen,
        Screen::Dashboard {
            display_name: "Mg Mg".into()
        }
    );
    assert_eq!(rx.try_recv().unwrap(), signed_in("Mg Mg"));
    assert_eq!(shell.require().unwrap().display_name(), "Mg Mg");
}

#[test]
fn confirmed_sign_up_signs_in_immediately() {
    let conn = conn();
    let auth = FakeAuth {
        autoconfirm: true,
        ..FakeAuth::default()
    };
    let mut shell = SessionShell::start(&auth, &conn).unwrap();
    let screen = shell.sign_up("Alice", "pw").unwrap();
    assert!(matches!(screen, Screen::Dashboard { .. }));
    assert!(get_setting(&conn, "session").unwrap().is_some());
}

#[test]
fn rejected_credentials_keep_auth_screen() {
    let conn = conn();
    let auth = FakeAuth::default();
    let mut shell = SessionShell::start(&auth, &conn).unwrap();
    let err = shell.sign_in("nobody", "pw").unwrap_err();
    assert!(matches!(err, TrackerError::Auth(_)));
    assert_eq!(err.to_string(), "Invalid login credentials");
    assert_eq!(shell.screen(), Screen::Auth);
    assert!(get_setting(&conn, "session").unwrap().is_none());

    assert!(matches!(
        shell.sign_in("  ", "pw"),
        Err(TrackerError::Validation(_))
    ));
    assert!(matches!(shell.require(), Err(TrackerError::Auth(_))));
}

#[test]
fn duplicate_sign_up_is_reported() {
    let conn = conn();
    let auth = FakeAuth::default();
    let mut shell = SessionShell::start(&auth, &conn).unwrap();
    shell.sign_up("bob", "pw").unwrap();
    let err = shell.sign_up("Bob", "other").unwrap_err();
    assert_eq!(err.to_string(), "User already registered");
}

#[test]
fn session_survives_restart_until_sign_out() {
    let conn = conn();
    let auth = FakeAuth::default();
    {
        let mut shell = SessionShell::start(&auth, &conn).unwrap();
        shell.sign_up("Carol", "pw").unwrap();
        shell.sign_in("Carol", "pw").unwrap();
    }

    let mut shell = SessionShell::start(&auth, &conn).unwrap();
    let rx = shell.subscribe();
    assert_eq!(rx.try_recv().unwrap(), signed_in("Carol"));

    shell.sign_out().unwrap();
    assert_eq!(rx.try_recv().unwrap(), signed_out());
    assert_eq!(auth.sign_outs.get(), 1);
    assert!(get_setting(&conn, "session").unwrap().is_none());

    let shell = SessionShell::start(&auth, &conn).unwrap();
    assert_eq!(shell.screen(), Screen::Auth);
}

#[test]
fn unreadable_persisted_session_is_dropped() {
    let conn = conn();
    moneytracker::db::set_setting(&conn, "session", "{not json").unwrap();
    let auth = FakeAuth::default();
    let shell = SessionShell::start(&auth, &conn).unwrap();
    assert_eq!(shell.screen(), Screen::Auth);
    assert!(get_setting(&conn, "session").unwrap().is_none());
}
