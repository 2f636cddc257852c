//! Integration tests: request handling of the authoritative session (sd-server).

use pretty_assertions::assert_eq;
use sd_core::{Point, ShapeRegistry, Vector};
use sd_editor::*;
use sd_server::{Outgoing, ServerSession};

fn request(seq: u64, command: &Command) -> ClientMessage {
    ClientMessage::Request {
        seq,
        command: command.to_wire(),
    }
}

// ─── Connection ─────────────────────────────────────────────────────────

#[test]
fn connect_identifies_then_snapshots() {
    let mut session = ServerSession::default();
    let (alice, greeting) = session.connect();
    assert_eq!(
        greeting,
        vec![
            ServerMessage::Identify { user: alice.clone() },
            ServerMessage::Snapshot { shapes: vec![] },
        ]
    );

    let mut client = ShapeRegistry::new();
    let s = client.circle(Point::new(3.0, 4.0), 2.0).unwrap();
    session.handle(&alice, request(1, &Command::add_shape(s.clone())));

    let (bob, greeting) = session.connect();
    assert_ne!(alice, bob);
    match &greeting[1] {
        ServerMessage::Snapshot { shapes } => {
            assert_eq!(shapes.len(), 1);
            assert_eq!(shapes[0].id, s.id());
            assert_eq!(shapes[0].center, Point::new(3.0, 4.0));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(session.users().count(), 2);
    session.disconnect(&alice);
    assert_eq!(session.users().count(), 1);
}

// ─── Requests ───────────────────────────────────────────────────────────

#[test]
fn accepted_request_is_broadcast_with_requester() {
    let mut session = ServerSession::default();
    let (alice, _) = session.connect();
    let (bob, _) = session.connect();
    let mut client = ShapeRegistry::new();
    let s = client.circle(Point::ORIGIN, 5.0).unwrap();
    let add = Command::add_shape(s);

    let out = session.handle(&alice, request(7, &add));
    assert_eq!(
        out,
        vec![Outgoing::Broadcast(ServerMessage::Change {
            command: add.to_wire(),
            user: alice.clone(),
            seq: 7,
        })]
    );
    assert!(out[0].includes(&alice));
    assert!(out[0].includes(&bob));
    assert_eq!(session.drawing().len(), 1);
    assert_eq!(session.log().size(), 1);
}

#[test]
fn conflicting_move_is_rejected_to_requester_only() {
    let mut session = ServerSession::default();
    let (alice, _) = session.connect();
    let (bob, _) = session.connect();
    let mut a = ShapeRegistry::new();
    let s = a.circle(Point::ORIGIN, 5.0).unwrap();
    session.handle(&alice, request(1, &Command::add_shape(s.clone())));

    // Both users drag the shape from the origin; Alice's arrives first.
    let alice_move = move_shape_command(s.clone(), Vector::new(10.0, 0.0));
    let bob_move = move_shape_command(s.clone(), Vector::new(0.0, 10.0));
    session.handle(&alice, request(2, &alice_move));
    let out = session.handle(&bob, request(1, &bob_move));

    assert_eq!(out.len(), 1);
    assert!(out[0].includes(&bob));
    assert!(!out[0].includes(&alice));
    match out[0].message() {
        ServerMessage::Response { reason, seq, .. } => {
            assert_eq!(*seq, 1);
            assert!(reason.contains("does not match"), "{reason}");
        }
        other => panic!("unexpected {other:?}"),
    }
    let shape = session.drawing().find(s.id()).unwrap();
    assert_eq!(shape.center(), Point::new(10.0, 0.0));
    assert_eq!(session.log().size(), 2);
}

#[test]
fn malformed_command_is_rejected_not_fatal() {
    let mut session = ServerSession::default();
    let (alice, _) = session.connect();
    let bogus: WireCommand = serde_json::from_value(serde_json::json!({
        "kind": "add_shape",
        "shape": {"type": "hexagon", "id": "h1", "center": {"x": 0.0, "y": 0.0}}
    }))
    .unwrap();
    let out = session.handle(
        &alice,
        ClientMessage::Request {
            seq: 3,
            command: bogus,
        },
    );
    match out[0].message() {
        ServerMessage::Response { reason, .. } => assert!(reason.contains("hexagon")),
        other => panic!("unexpected {other:?}"),
    }
    assert!(session.drawing().is_empty());
}

#[test]
fn undecodable_request_is_answered_without_a_command() {
    let mut session = ServerSession::default();
    let (alice, _) = session.connect();
    let (bob, _) = session.connect();
    let out = session.reject_malformed(&alice, 5, "missing field `kind`".into());
    assert_eq!(out.len(), 1);
    assert!(out[0].includes(&alice));
    assert!(!out[0].includes(&bob));
    assert_eq!(
        out[0].message(),
        &ServerMessage::Response {
            command: None,
            reason: "missing field `kind`".into(),
            seq: 5,
        }
    );
}

#[test]
fn undo_request_reverts_shared_state() {
    let mut session = ServerSession::default();
    let (alice, _) = session.connect();
    let mut a = ShapeRegistry::new();
    let s = a.circle(Point::ORIGIN, 5.0).unwrap();
    let add = Command::add_shape(s);
    session.handle(&alice, request(1, &add));
    session.handle(&alice, request(2, &undo_command(&add)));
    assert!(session.drawing().is_empty());
    assert_eq!(session.log().size(), 2);
}

// ─── Presence ───────────────────────────────────────────────────────────

#[test]
fn pointer_goes_to_everyone_else() {
    let mut session = ServerSession::default();
    let (alice, _) = session.connect();
    let (bob, _) = session.connect();
    let out = session.handle(
        &alice,
        ClientMessage::Pointer {
            position: Point::new(1.0, 2.0),
        },
    );
    assert_eq!(
        out,
        vec![Outgoing::BroadcastExcept(
            alice.clone(),
            ServerMessage::Pointer {
                position: Point::new(1.0, 2.0),
                user: alice.clone(),
            }
        )]
    );
    assert!(out[0].includes(&bob));
    assert!(!out[0].includes(&alice));
    assert_eq!(session.log().size(), 0);
}
