//! Integration tests for the engine: commands, replies and grace timers.

use std::time::Duration;

use dibs::{
    announcement_channel, AnnouncementReceiver, Command, ManualClock, ManualScheduler,
    ParsedLine, PlainDecorator, QueueState, RoomName, TurnQueueEngine, UserId, Verb,
};

// =========================================================================
// Harness
// =========================================================================

struct Harness {
    engine: TurnQueueEngine,
    scheduler: ManualScheduler,
    announcements: AnnouncementReceiver,
}

fn harness() -> Harness {
    let clock = ManualClock::new();
    let scheduler = ManualScheduler::new(clock.clone());
    let (tx, rx) = announcement_channel();
    let engine = TurnQueueEngine::builder()
        .clock(clock)
        .scheduler(scheduler.clone())
        .decorator(PlainDecorator)
        .announcements(tx)
        .build()
        .unwrap();
    Harness {
        engine,
        scheduler,
        announcements: rx,
    }
}

fn room() -> RoomName {
    RoomName::new("ops").unwrap()
}

fn user(name: &str) -> UserId {
    UserId::new(name).unwrap()
}

impl Harness {
    fn say(&self, name: &str, verb: Verb) -> String {
        self.engine.dispatch(&Command::new(room(), user(name), verb))
    }

    fn say_for(&self, actor: &str, target: &str, verb: Verb) -> String {
        let command = Command::new(room(), user(actor), verb).on_behalf_of(user(target));
        self.engine.dispatch(&command)
    }

    fn wait(&self, secs: u64) -> usize {
        self.scheduler.advance(Duration::from_secs(secs))
    }

    fn state(&self) -> QueueState {
        self.engine.queue_state(&room())
    }

    fn line(&self) -> Vec<String> {
        self.engine
            .snapshot(&room())
            .entries
            .into_iter()
            .map(|e| e.user.to_string())
            .collect()
    }

    fn announcement(&mut self) -> Option<String> {
        self.announcements.try_recv().ok().map(|a| a.text)
    }

    /// alice holds, bob and carol wait.
    fn three_in_line(&self) {
        self.say("alice", Verb::Request);
        self.say("bob", Verb::Request);
        self.say("carol", Verb::Request);
    }
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn test_request_on_empty_room_grants_immediately() {
    let h = harness();
    assert_eq!(h.say("alice", Verb::Request), "alice the baton is yours!");
    assert_eq!(h.state(), QueueState::Held(user("alice")));
    assert_eq!(h.scheduler.pending(), 0);
}

#[test]
fn test_waiters_listed_in_order() {
    let h = harness();
    h.say("alice", Verb::Request);
    h.wait(10);
    assert_eq!(
        h.say("bob", Verb::Request),
        "bob calls (dibs) on the baton after alice... fyi @alice"
    );
    h.wait(5);
    assert_eq!(
        h.say("carol", Verb::Request),
        "carol calls (dibs) on the baton after bob... fyi @alice"
    );
    h.wait(3);

    assert_eq!(h.line(), ["alice", "bob", "carol"]);
    assert_eq!(
        h.say("dave", Verb::Status),
        "alice has had the baton for 00:00:18\n\
         ... followed by bob, waiting for 00:00:08\n\
         ... followed by carol, waiting for 00:00:03"
    );
}

#[test]
fn test_release_hands_off_with_grace_window() {
    let h = harness();
    h.three_in_line();
    h.wait(30);

    assert_eq!(
        h.say("alice", Verb::Release),
        "alice releases the baton after 00:00:30.\n\
         @bob the baton is yours if you call dibs again within 60 seconds!"
    );
    assert_eq!(h.state(), QueueState::PendingHandoff(user("bob")));
    assert_eq!(h.line(), ["bob", "carol"]);
    assert_eq!(h.scheduler.pending(), 1);
}

#[test]
fn test_reconfirm_makes_timer_a_no_op() {
    let mut h = harness();
    h.three_in_line();
    h.say("alice", Verb::Release);
    h.wait(20);

    assert_eq!(h.say("bob", Verb::Request), "bob claims the baton");
    assert_eq!(h.state(), QueueState::Held(user("bob")));

    assert_eq!(h.wait(60), 1);
    assert_eq!(h.state(), QueueState::Held(user("bob")));
    assert_eq!(h.line(), ["bob", "carol"]);
    assert_eq!(h.announcement(), None);
}

#[test]
fn test_grace_expiry_demotes_and_confirms_last_waiter() {
    let mut h = harness();
    h.three_in_line();
    h.say("alice", Verb::Release);

    assert_eq!(h.wait(60), 1);
    assert_eq!(
        h.announcement().as_deref(),
        Some(
            "bob didn't call dibs within 60 seconds and goes to the back of the line.\n\
             @carol the baton is yours!"
        )
    );
    // Only bob is behind carol, so there is nobody to cascade to.
    assert_eq!(h.state(), QueueState::Held(user("carol")));
    assert_eq!(h.line(), ["carol", "bob"]);
    assert_eq!(h.scheduler.pending(), 0);
}

#[test]
fn test_grace_expiry_cascades_with_fresh_window() {
    let mut h = harness();
    h.three_in_line();
    h.say("dave", Verb::Request);
    h.say("alice", Verb::Release);

    assert_eq!(h.wait(60), 1);
    assert_eq!(
        h.announcement().as_deref(),
        Some(
            "bob didn't call dibs within 60 seconds and goes to the back of the line.\n\
             @carol the baton is yours if you call dibs again within 60 seconds!"
        )
    );
    assert_eq!(h.state(), QueueState::PendingHandoff(user("carol")));
    assert_eq!(h.line(), ["carol", "dave", "bob"]);

    // The fresh window runs from the forfeit, not the first release.
    assert_eq!(h.wait(59), 0);
    assert_eq!(h.wait(1), 1);
    assert_eq!(h.state(), QueueState::PendingHandoff(user("dave")));
    assert_eq!(h.line(), ["dave", "bob", "carol"]);
}

#[test]
fn test_locked_queue_answers_with_status() {
    let h = harness();
    assert_eq!(h.say("alice", Verb::Lock), "@all alice has locked the baton!");
    h.wait(42);

    let status = "alice has had the baton locked for 00:00:42";
    assert_eq!(h.say("bob", Verb::Request), status);
    assert_eq!(h.say("alice", Verb::Release), status);
    assert_eq!(h.say("bob", Verb::Steal), status);
    assert_eq!(h.say("bob", Verb::Rejoin), status);
    assert_eq!(h.say("bob", Verb::Lock), status);
    assert_eq!(h.state(), QueueState::Locked(user("alice")));

    h.wait(78);
    assert_eq!(
        h.say("alice", Verb::Unlock),
        "@all alice has unlocked the baton after 00:02:00!"
    );
    assert_eq!(h.state(), QueueState::Empty);
    assert_eq!(h.say("bob", Verb::Status), "The baton queue is empty");
    assert_eq!(
        h.say("bob", Verb::Unlock),
        "The baton is not locked. (pokerface)"
    );
}

#[test]
fn test_lock_clears_waiters_and_strands_timer() {
    let mut h = harness();
    h.three_in_line();
    h.say("alice", Verb::Release);
    h.say("dave", Verb::Lock);
    assert_eq!(h.line(), ["dave"]);

    assert_eq!(h.wait(60), 1);
    assert_eq!(h.state(), QueueState::Locked(user("dave")));
    assert_eq!(h.announcement(), None);
}

#[test]
fn test_steal_jumps_the_line() {
    let h = harness();
    h.say("alice", Verb::Request);
    h.say("bob", Verb::Request);

    assert_eq!(
        h.say("carol", Verb::Steal),
        "carol stole the baton from @alice and jumped the line in front of @bob! srsly?"
    );
    assert_eq!(h.state(), QueueState::Held(user("carol")));
    assert_eq!(h.line(), ["carol", "bob"]);
}

#[test]
fn test_steal_from_pending_holder_skips_window() {
    let mut h = harness();
    h.three_in_line();
    h.say("alice", Verb::Release);

    assert_eq!(h.say("carol", Verb::Steal), "carol stole the baton from @bob!");
    assert_eq!(h.state(), QueueState::Held(user("carol")));

    h.wait(60);
    assert_eq!(h.state(), QueueState::Held(user("carol")));
    assert_eq!(h.announcement(), None);
}

#[test]
fn test_self_steal_is_refused() {
    let h = harness();
    h.say("alice", Verb::Request);
    assert_eq!(
        h.say("alice", Verb::Steal),
        "alice inexplicably attempts to steal the baton from alice (derp)"
    );
    assert_eq!(h.say("bob", Verb::Steal), "bob stole the baton from @alice!");
}

// =========================================================================
// Tickets
// =========================================================================

#[test]
fn test_timer_never_regrants_to_rejoined_user() {
    let mut h = harness();
    h.three_in_line();
    h.say("alice", Verb::Release);
    // bob walks away while pending and comes straight back.
    h.say("bob", Verb::Release);
    h.say("bob", Verb::Request);
    assert_eq!(h.line(), ["carol", "bob"]);

    h.wait(60);
    assert_eq!(h.state(), QueueState::Held(user("carol")));
    assert_eq!(h.line(), ["carol", "bob"]);
    assert_eq!(h.announcement(), None);
}

#[test]
fn test_dropped_engine_silences_timers() {
    let Harness {
        engine,
        scheduler,
        mut announcements,
    } = harness();
    for name in ["alice", "bob", "carol"] {
        engine.dispatch(&Command::new(room(), user(name), Verb::Request));
    }
    engine.dispatch(&Command::new(room(), user("alice"), Verb::Release));
    drop(engine);

    assert_eq!(scheduler.advance(Duration::from_secs(60)), 1);
    assert!(announcements.try_recv().is_err());
}

// =========================================================================
// Refusals, rejoin and proxies
// =========================================================================

#[test]
fn test_duplicate_requests_change_nothing() {
    let h = harness();
    h.say("alice", Verb::Request);
    h.say("bob", Verb::Request);

    assert_eq!(
        h.say("alice", Verb::Request),
        "alice already has the baton (pokerface)"
    );
    assert_eq!(
        h.say("bob", Verb::Request),
        "bob is already queued for the baton"
    );
    assert_eq!(h.say("dave", Verb::Release), "dave is not queued for the baton");
    assert_eq!(h.line(), ["alice", "bob"]);
}

#[test]
fn test_waiter_withdraws() {
    let h = harness();
    h.three_in_line();
    assert_eq!(h.say("bob", Verb::Release), "bob rescinds dibs on the baton");
    assert_eq!(h.line(), ["alice", "carol"]);
    assert_eq!(h.scheduler.pending(), 0);
}

#[test]
fn test_release_to_lone_waiter_is_confirmed() {
    let h = harness();
    h.say("alice", Verb::Request);
    h.say("bob", Verb::Request);
    assert_eq!(
        h.say("alice", Verb::Release),
        "alice releases the baton after 00:00:00.\n@bob the baton is yours!"
    );
    assert_eq!(h.state(), QueueState::Held(user("bob")));
    assert_eq!(h.scheduler.pending(), 0);
}

#[test]
fn test_rejoin_requeues_holder() {
    let h = harness();
    h.three_in_line();
    assert_eq!(
        h.say("alice", Verb::Rejoin),
        "alice releases the baton after 00:00:00.\n\
         @bob the baton is yours if you call dibs again within 60 seconds!\n\
         alice calls (dibs) on the baton after carol... fyi @bob"
    );
    assert_eq!(h.line(), ["bob", "carol", "alice"]);
    assert_eq!(h.state(), QueueState::PendingHandoff(user("bob")));
    assert_eq!(h.scheduler.pending(), 1);
}

#[test]
fn test_rejoin_alone_is_pointless() {
    let h = harness();
    h.say("alice", Verb::Request);
    assert_eq!(
        h.say("alice", Verb::Rejoin),
        "alice is giving up the baton for alice (pokerface)"
    );
    assert_eq!(h.line(), ["alice"]);
}

#[test]
fn test_rejoin_outside_line_requests() {
    let h = harness();
    assert_eq!(h.say("alice", Verb::Rejoin), "alice the baton is yours!");
}

#[test]
fn test_proxy_wording() {
    let h = harness();
    assert_eq!(
        h.say_for("bob", "alice", Verb::Request),
        "bob hands the baton to @alice!"
    );
    assert_eq!(h.state(), QueueState::Held(user("alice")));
    assert_eq!(
        h.say_for("bob", "carol", Verb::Request),
        "bob calls (dibs) on the baton for @carol after alice... fyi @alice"
    );
    assert_eq!(
        h.say_for("bob", "carol", Verb::Release),
        "bob rescinds dibs for @carol on the baton"
    );
    assert_eq!(
        h.say_for("bob", "dave", Verb::Lock),
        "@all bob has locked the baton for @dave!"
    );
}

#[test]
fn test_acting_for_yourself_is_not_a_proxy() {
    let h = harness();
    assert_eq!(
        h.say_for("alice", "alice", Verb::Request),
        "alice the baton is yours!"
    );
}

// =========================================================================
// Rooms
// =========================================================================

#[test]
fn test_rooms_are_independent() {
    let h = harness();
    let dev = RoomName::new("dev").unwrap();
    h.say("alice", Verb::Request);
    h.engine
        .dispatch(&Command::new(dev.clone(), user("alice"), Verb::Lock));

    assert_eq!(h.state(), QueueState::Held(user("alice")));
    assert_eq!(h.engine.queue_state(&dev), QueueState::Locked(user("alice")));
    assert_eq!(h.engine.room_count(), 2);
}

#[test]
fn test_concurrent_dispatch_leaves_consistent_rooms() {
    let h = harness();
    let names = ["alice", "bob", "carol", "dave", "erin", "frank"];

    std::thread::scope(|s| {
        for name in names {
            let engine = h.engine.clone();
            s.spawn(move || {
                for i in 0..50 {
                    let room = RoomName::new(if i % 2 == 0 { "ops" } else { "dev" }).unwrap();
                    let me = user(name);
                    engine.dispatch(&Command::new(room.clone(), me.clone(), Verb::Request));
                    engine.dispatch(&Command::new(room.clone(), me.clone(), Verb::Status));
                    engine.dispatch(&Command::new(room, me, Verb::Release));
                }
            });
        }
    });

    assert_eq!(h.state(), QueueState::Empty);
    assert_eq!(
        h.engine.queue_state(&RoomName::new("dev").unwrap()),
        QueueState::Empty
    );
    // Stranded timers from the churn all find nothing to do.
    h.wait(60);
    assert_eq!(h.state(), QueueState::Empty);
}

// =========================================================================
// Chat lines
// =========================================================================

fn chat(sender: &str, raw: &str) -> ParsedLine {
    let mut words = raw.split_whitespace();
    let command = raw
        .starts_with('!')
        .then(|| words.next().map(|w| w.trim_start_matches('!').to_string()))
        .flatten();
    ParsedLine {
        room: room(),
        user: user(sender),
        raw: raw.to_string(),
        command,
        args: words.map(String::from).collect(),
    }
}

#[test]
fn test_evaluate_commands_and_aliases() {
    let h = harness();
    assert_eq!(
        h.engine.evaluate(&chat("alice", "!+")).as_deref(),
        Some("alice the baton is yours!")
    );
    assert_eq!(
        h.engine.evaluate(&chat("carol", "!DIBS @bob")).as_deref(),
        Some("carol calls (dibs) on the baton for @bob after alice... fyi @alice")
    );
    assert_eq!(
        h.engine.evaluate(&chat("alice", "!?")).as_deref(),
        Some(
            "alice has had the baton for 00:00:00\n\
             ... followed by bob, waiting for 00:00:00"
        )
    );
}

#[test]
fn test_evaluate_ignores_chatter_and_itself() {
    let h = harness();
    assert_eq!(h.engine.evaluate(&chat("alice", "lunch anyone?")), None);
    assert_eq!(h.engine.evaluate(&chat("dibsbot", "!dibs")), None);
    assert_eq!(h.engine.room_count(), 0);
}

#[test]
fn test_evaluate_mentions() {
    let h = harness();
    assert_eq!(
        h.engine.evaluate(&chat("alice", "thanks dibsbot")).as_deref(),
        Some("Hi @alice")
    );
    assert_eq!(
        h.engine.evaluate(&chat("alice", "/me hugs dibsbot")).as_deref(),
        Some("/me hugs alice")
    );
}

#[test]
fn test_evaluate_unknown_or_broken_falls_back_to_help() {
    let h = harness();
    let help = h.engine.help();
    assert_eq!(h.engine.evaluate(&chat("alice", "!frobnicate")), Some(help.clone()));
    assert_eq!(h.engine.evaluate(&chat("alice", "!dibs @")), Some(help));
}

// =========================================================================
// Tokio timers
// =========================================================================

fn tokio_engine() -> (TurnQueueEngine, AnnouncementReceiver) {
    let (tx, rx) = announcement_channel();
    let engine = TurnQueueEngine::builder()
        .decorator(PlainDecorator)
        .announcements(tx)
        .build()
        .unwrap();
    (engine, rx)
}

#[tokio::test(start_paused = true)]
async fn test_tokio_grace_window_expires() {
    let (engine, mut rx) = tokio_engine();
    for name in ["alice", "bob", "carol"] {
        engine.dispatch(&Command::new(room(), user(name), Verb::Request));
    }
    let start = tokio::time::Instant::now();
    engine.dispatch(&Command::new(room(), user("alice"), Verb::Release));

    let announcement = rx.recv().await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(60));
    assert_eq!(announcement.room, room());
    assert!(announcement.text.starts_with("bob didn't call dibs within 60 seconds"));
    assert_eq!(engine.queue_state(&room()), QueueState::Held(user("carol")));
}

#[tokio::test(start_paused = true)]
async fn test_tokio_reconfirm_before_expiry() {
    let (engine, mut rx) = tokio_engine();
    for name in ["alice", "bob", "carol"] {
        engine.dispatch(&Command::new(room(), user(name), Verb::Request));
    }
    engine.dispatch(&Command::new(room(), user("alice"), Verb::Release));

    tokio::time::sleep(Duration::from_secs(30)).await;
    engine.dispatch(&Command::new(room(), user("bob"), Verb::Request));
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert!(rx.try_recv().is_err());
    assert_eq!(engine.queue_state(&room()), QueueState::Held(user("bob")));
}
