//! Integration tests: replicated log against a scripted server (sd-editor).
//!
//! The transport records outgoing messages; tests play the server by
//! turning recorded requests into `change` or `response` messages.

use pretty_assertions::assert_eq;
use sd_core::{Point, ShapeRegistry, Vector};
use sd_editor::*;
use std::time::{Duration, Instant};

#[derive(Default)]
struct Recording {
    sent: Vec<ClientMessage>,
    closed: bool,
}

impl Transport for Recording {
    fn send(&mut self, message: ClientMessage) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError("recording closed".into()));
        }
        self.sent.push(message);
        Ok(())
    }
}

fn replica(user: &str) -> ReplicatedLog<Recording> {
    let mut r = ReplicatedLog::new(Recording::default());
    r.handle(ServerMessage::Identify {
        user: UserId::new(user),
    })
    .unwrap();
    r
}

/// Drain the replica's requests, echoing each back as a confirmed change.
fn confirm_all(r: &mut ReplicatedLog<Recording>) -> Vec<ServerMessage> {
    let user = r.user().cloned().unwrap();
    let sent = std::mem::take(&mut r.transport_mut().sent);
    let mut echoes = Vec::new();
    for message in sent {
        if let ClientMessage::Request { seq, command } = message {
            let change = ServerMessage::Change {
                command,
                user: user.clone(),
                seq,
            };
            r.handle(change.clone()).unwrap();
            echoes.push(change);
        }
    }
    echoes
}

// ─── Requests and confirmation ──────────────────────────────────────────

#[test]
fn add_only_transmits() {
    let mut r = replica("alice");
    let s = r.registry_mut().circle(Point::ORIGIN, 5.0).unwrap();
    let seq = r.add(Command::add_shape(s.clone())).unwrap();

    assert!(r.drawing().is_empty());
    assert_eq!(r.history().size(), 0);
    assert_eq!(r.pending_len(), 1);
    match &r.transport().sent[0] {
        ClientMessage::Request { seq: sent, command } => {
            assert_eq!(*sent, seq);
            assert!(matches!(command, WireCommand::AddShape { .. }));
        }
        other => panic!("unexpected {other:?}"),
    }

    confirm_all(&mut r);
    assert!(r.drawing().contains(&s));
    assert_eq!(r.history().size(), 1);
    assert_eq!(r.pending_len(), 0);
}

#[test]
fn log_withdraws_speculative_move_until_confirmed() {
    let mut r = replica("alice");
    let s = r.registry_mut().circle(Point::ORIGIN, 5.0).unwrap();
    r.add(Command::add_shape(s.clone())).unwrap();
    confirm_all(&mut r);

    let drag = move_shape_command(s.clone(), Vector::new(4.0, 0.0));
    drag.apply(r.drawing_mut()).unwrap();
    assert_eq!(s.center(), Point::new(4.0, 0.0));
    r.log(drag).unwrap();
    assert_eq!(s.center(), Point::ORIGIN);

    confirm_all(&mut r);
    assert_eq!(s.center(), Point::new(4.0, 0.0));
    assert_eq!(r.history().size(), 2);
}

#[test]
fn log_without_speculative_apply_is_refused() {
    let mut r = replica("alice");
    let s = r.registry_mut().circle(Point::ORIGIN, 5.0).unwrap();
    let err = r
        .log(move_shape_command(s.clone(), Vector::new(1.0, 0.0)))
        .unwrap_err();
    assert!(matches!(err, SyncError::Command(CommandError::CenterMismatch { .. })));
    assert!(r.transport().sent.is_empty());
    assert_eq!(s.center(), Point::ORIGIN);
}

#[test]
fn change_from_another_user_resolves_to_local_instances() {
    let mut alice = replica("alice");
    let mut bob = replica("bob");
    let s = alice.registry_mut().square(Point::new(10.0, 10.0), 4.0).unwrap();
    alice.add(Command::add_shape(s.clone())).unwrap();
    let echoes = confirm_all(&mut alice);

    for echo in echoes {
        match bob.handle(echo).unwrap() {
            ReplicaEvent::Changed { user, own, .. } => {
                assert_eq!(user, UserId::new("alice"));
                assert!(!own);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
    let theirs = bob.drawing().find(s.id()).unwrap().clone();
    assert!(!theirs.ptr_eq(&s));
    assert_eq!(theirs.dimensions(), Some((4.0, 4.0)));

    // Bob moves it; Alice sees the move on her own instance.
    bob.add(move_shape_command(theirs.clone(), Vector::new(1.0, 1.0)))
        .unwrap();
    for echo in confirm_all(&mut bob) {
        alice.handle(echo).unwrap();
    }
    assert_eq!(s.center(), Point::new(11.0, 11.0));
    assert_eq!(theirs.center(), Point::new(11.0, 11.0));
    assert_eq!(alice.history().size(), 2);
    assert!(alice.can_undo());
}

#[test]
fn diverged_change_is_an_error() {
    let mut r = replica("alice");
    let mut elsewhere = ShapeRegistry::new();
    let s = elsewhere.circle(Point::ORIGIN, 1.0).unwrap();
    let stale = Command::move_shape(s, Point::new(9.0, 9.0), Vector::new(1.0, 0.0));
    let err = r
        .handle(ServerMessage::Change {
            command: stale.to_wire(),
            user: UserId::new("bob"),
            seq: 1,
        })
        .unwrap_err();
    assert!(matches!(err, SyncError::Command(_)));
    assert_eq!(r.history().size(), 0);
}

#[test]
fn own_change_that_fails_to_apply_is_not_undoable() {
    let mut r = replica("alice");
    let s = r.registry_mut().circle(Point::ORIGIN, 1.0).unwrap();
    r.add(Command::move_shape(s.clone(), Point::new(9.0, 9.0), Vector::new(1.0, 0.0)))
        .unwrap();

    let sent = std::mem::take(&mut r.transport_mut().sent);
    let Some(ClientMessage::Request { seq, command }) = sent.into_iter().next() else {
        panic!("expected a request");
    };
    let err = r
        .handle(ServerMessage::Change {
            command,
            user: UserId::new("alice"),
            seq,
        })
        .unwrap_err();
    assert!(matches!(err, SyncError::Command(_)));
    assert_eq!(r.pending_len(), 0);
    assert_eq!(r.history().size(), 0);
    assert!(!r.can_undo());
    assert_eq!(s.center(), Point::ORIGIN);
}

// ─── Rejection and expiry ───────────────────────────────────────────────

#[test]
fn rejection_clears_pending_and_reports_command() {
    let mut r = replica("alice");
    let s = r.registry_mut().circle(Point::ORIGIN, 5.0).unwrap();
    let cmd = Command::add_shape(s);
    let seq = r.add(cmd.clone()).unwrap();

    let event = r
        .handle(ServerMessage::Response {
            command: Some(cmd.to_wire()),
            reason: "cannot add again".into(),
            seq,
        })
        .unwrap();
    match event {
        ReplicaEvent::Rejected {
            command: Some(sent),
            reason,
            seq: rejected,
        } => {
            assert!(sent.ptr_eq(&cmd));
            assert_eq!(reason, "cannot add again");
            assert_eq!(rejected, seq);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(r.pending_len(), 0);
    assert!(r.drawing().is_empty());
}

#[test]
fn stale_requests_expire() {
    let mut r = ReplicatedLog::with_config(
        Recording::default(),
        ReplicaConfig {
            request_timeout: Duration::from_millis(50),
        },
    );
    let s = r.registry_mut().circle(Point::ORIGIN, 5.0).unwrap();
    let cmd = Command::add_shape(s);
    r.add(cmd.clone()).unwrap();

    assert!(r.expire_pending(Instant::now()).is_empty());
    let expired = r.expire_pending(Instant::now() + Duration::from_secs(1));
    assert_eq!(expired.len(), 1);
    assert!(expired[0].ptr_eq(&cmd));
    assert_eq!(r.pending_len(), 0);
}

#[test]
fn closed_transport_surfaces_error() {
    let mut r = replica("alice");
    r.transport_mut().closed = true;
    let s = r.registry_mut().circle(Point::ORIGIN, 5.0).unwrap();
    let err = r.add(Command::add_shape(s)).unwrap_err();
    assert!(matches!(err, SyncError::Transport(_)));
    assert_eq!(r.pending_len(), 0);
}

// ─── Undo / redo ────────────────────────────────────────────────────────

#[test]
fn undo_and_redo_go_through_the_server() {
    let mut r = replica("alice");
    let s = r.registry_mut().circle(Point::ORIGIN, 5.0).unwrap();
    r.add(Command::add_shape(s.clone())).unwrap();
    confirm_all(&mut r);
    r.add(move_shape_command(s.clone(), Vector::new(2.0, 0.0)))
        .unwrap();
    confirm_all(&mut r);
    assert!(r.can_undo());
    assert!(!r.can_redo());

    assert!(r.undo().unwrap());
    // Nothing changes until the server confirms.
    assert_eq!(s.center(), Point::new(2.0, 0.0));
    assert!(!r.can_redo());
    confirm_all(&mut r);
    assert_eq!(s.center(), Point::ORIGIN);
    assert!(r.can_redo());

    assert!(r.undo().unwrap());
    confirm_all(&mut r);
    assert!(r.drawing().is_empty());
    assert!(!r.can_undo());
    assert!(!r.undo().unwrap());

    assert!(r.redo().unwrap());
    assert!(r.redo().unwrap());
    confirm_all(&mut r);
    assert!(r.drawing().contains(&s));
    assert_eq!(s.center(), Point::new(2.0, 0.0));
    assert_eq!(r.history().size(), 6);
}

#[test]
fn rejected_undo_can_be_retried() {
    let mut r = replica("alice");
    let s = r.registry_mut().circle(Point::ORIGIN, 5.0).unwrap();
    r.add(Command::add_shape(s.clone())).unwrap();
    confirm_all(&mut r);

    r.undo().unwrap();
    assert!(!r.can_undo());
    let (seq, command) = match r.transport_mut().sent.pop() {
        Some(ClientMessage::Request { seq, command }) => (seq, command),
        other => panic!("unexpected {other:?}"),
    };
    r.handle(ServerMessage::Response {
        command: Some(command),
        reason: "conflict".into(),
        seq,
    })
    .unwrap();
    assert!(r.can_undo());
    assert!(!r.can_redo());
}

#[test]
fn new_edit_clears_redo() {
    let mut r = replica("alice");
    let s = r.registry_mut().circle(Point::ORIGIN, 5.0).unwrap();
    r.add(Command::add_shape(s.clone())).unwrap();
    confirm_all(&mut r);
    r.undo().unwrap();
    confirm_all(&mut r);
    assert!(r.can_redo());

    let t = r.registry_mut().circle(Point::new(20.0, 0.0), 5.0).unwrap();
    r.add(Command::add_shape(t)).unwrap();
    assert!(!r.can_redo());
}

#[test]
fn undo_confirmed_after_a_newer_edit_offers_no_redo() {
    let mut r = replica("alice");
    let s = r.registry_mut().circle(Point::ORIGIN, 5.0).unwrap();
    r.add(Command::add_shape(s.clone())).unwrap();
    confirm_all(&mut r);

    // The undo is still in flight when the next edit goes out.
    r.undo().unwrap();
    let t = r.registry_mut().circle(Point::new(20.0, 0.0), 5.0).unwrap();
    r.add(Command::add_shape(t.clone())).unwrap();
    confirm_all(&mut r);

    assert!(!r.drawing().contains(&s));
    assert!(r.drawing().contains(&t));
    assert!(!r.can_redo());
    assert!(r.can_undo());
}

// ─── Presence and late join ─────────────────────────────────────────────

#[test]
fn snapshot_populates_drawing_without_history() {
    let mut source = ShapeRegistry::new();
    let a = source.circle(Point::ORIGIN, 5.0).unwrap();
    let b = source.square(Point::new(20.0, 20.0), 2.0).unwrap();

    let mut r = replica("carol");
    let event = r
        .handle(ServerMessage::Snapshot {
            shapes: vec![a.to_wire(), b.to_wire(), a.to_wire()],
        })
        .unwrap();
    assert!(matches!(event, ReplicaEvent::Synced { added: 2 }));
    assert_eq!(r.drawing().len(), 2);
    assert_eq!(r.history().size(), 0);
}

#[test]
fn pointer_messages_pass_through() {
    let mut r = replica("alice");
    r.pointer(Point::new(3.0, 4.0)).unwrap();
    assert_eq!(
        r.transport().sent,
        vec![ClientMessage::Pointer {
            position: Point::new(3.0, 4.0)
        }]
    );
    let event = r
        .handle(ServerMessage::Pointer {
            position: Point::new(1.0, 1.0),
            user: UserId::new("bob"),
        })
        .unwrap();
    assert!(matches!(event, ReplicaEvent::Pointer { ref user, .. } if user.0 == "bob"));
}
