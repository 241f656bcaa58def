use deckmath_game::protocol::{ApiRequest, Endpoint, HttpReply};
use deckmath_game::{
    Effect, EffectsExt, Game24Rules, GameRules, ManualClock, Phase, PlayMode, RunningSumRules,
    ScheduledAction, SessionConfig, SessionController, SessionIdentity, StatusTone,
    TransportError,
};
use serde_json::{Value, json};

type Controller<R> = SessionController<R, ManualClock>;

fn controller<R: GameRules>(rules: R) -> (Controller<R>, ManualClock) {
    let clock = ManualClock::starting_at(1_000);
    let session = SessionController::new(
        rules,
        clock.clone(),
        SessionConfig::default(),
        SessionIdentity::fixed("client-1", "guest-1"),
    );
    (session, clock)
}

fn reply_to<R: GameRules>(
    session: &mut Controller<R>,
    effects: &[Effect],
    endpoint: Endpoint,
    body: Value,
) -> Vec<Effect> {
    let ticket = effects
        .ticket_for(endpoint)
        .unwrap_or_else(|| panic!("no {endpoint:?} request in {effects:?}"));
    session.handle_reply(ticket, Ok(HttpReply::ok(body)))
}

fn deal_with<R: GameRules>(session: &mut Controller<R>, body: Value) -> Vec<Effect> {
    let effects = session.deal(true, None);
    reply_to(session, &effects, Endpoint::Next, body)
}

fn standard_hand() -> Value {
    json!({"case_id": 7, "question": [2, 3, 5, 9], "target": 24, "seq": 1})
}

fn sent_request(effects: &[Effect], endpoint: Endpoint) -> ApiRequest {
    effects
        .iter()
        .find_map(|effect| effect.request().filter(|r| r.endpoint() == endpoint).cloned())
        .unwrap_or_else(|| panic!("no {endpoint:?} request in {effects:?}"))
}

#[test]
fn correct_answer_schedules_next_deal() {
    let (mut session, _clock) = controller(Game24Rules);
    deal_with(&mut session, standard_hand());
    assert_eq!(session.state().phase, Phase::Playing);
    assert_eq!(session.state().display_sequence, 1);
    assert_eq!(session.state().next_request_sequence, 2);

    let effects = session.submit_answer("(9−5)×3×2");
    let ApiRequest::Check(check) = sent_request(&effects, Endpoint::Check) else {
        panic!("expected a check request");
    };
    assert_eq!(check.answer, "(9-5)*3*2");
    assert_eq!(check.values, vec![2, 3, 5, 9]);
    assert_eq!(check.target, Some(24));
    assert_eq!(check.step, None);

    let effects = reply_to(&mut session, &effects, Endpoint::Check, json!({"ok": true}));
    assert_eq!(session.stats().solved, 1);
    assert_eq!(session.stats().played, 1);
    assert_eq!(session.state().phase, Phase::Solved);
    assert_eq!(session.status().tone, StatusTone::Success);
    let (token, delay) = effects.scheduled().expect("auto-advance armed");
    assert_eq!(delay, 900);

    let effects = session.fire_scheduled(token);
    let ApiRequest::Next(next) = sent_request(&effects, Endpoint::Next) else {
        panic!("expected a deal");
    };
    assert_eq!(next.seq, 2);
    assert!(session.state().current_envelope.is_none());
}

#[test]
fn played_counts_once_per_hand() {
    let (mut session, _clock) = controller(Game24Rules);
    deal_with(&mut session, standard_hand());

    let effects = session.request_hint(false);
    reply_to(
        &mut session,
        &effects,
        Endpoint::Help,
        json!({"has_solution": true, "solutions": ["(9-5)*3*2"]}),
    );
    assert_eq!((session.stats().played, session.stats().revealed), (1, 1));
    assert_eq!(session.hint().map(|h| h.lines.len()), Some(1));

    let effects = session.submit_answer("2+3+5+9");
    reply_to(&mut session, &effects, Endpoint::Check, json!({"ok": false, "reason": "Not 24"}));
    assert_eq!(session.stats().played, 1);
    assert_eq!(session.stats().incorrect, 1);
    assert_eq!(session.status().text, "✗ Not 24");

    let effects = session.request_hint(true);
    reply_to(
        &mut session,
        &effects,
        Endpoint::Help,
        json!({"has_solution": true, "solutions": ["a", "b"]}),
    );
    assert_eq!((session.stats().played, session.stats().revealed), (1, 1));

    deal_with(&mut session, json!({"case_id": 8, "values": [1, 1, 1, 1], "seq": 2}));
    let effects = session.submit_answer("1+1+1+1");
    reply_to(&mut session, &effects, Endpoint::Check, json!({"ok": false}));
    assert_eq!(session.stats().played, 2);
    assert_eq!(session.status().text, "✗ Try again!");
}

#[test]
fn partial_server_stats_keep_untouched_fields() {
    let (mut session, _clock) = controller(Game24Rules);
    let mut hand = standard_hand();
    hand["stats"] = json!({"played": 3, "solved": 2, "revealed": 1});
    deal_with(&mut session, hand);
    assert_eq!(session.stats().played, 3);

    let effects = session.submit_answer("(9-5)*3*2");
    reply_to(
        &mut session,
        &effects,
        Endpoint::Check,
        json!({"ok": true, "stats": {"solved": 5}}),
    );
    let stats = session.stats();
    assert_eq!((stats.played, stats.solved, stats.revealed), (3, 5, 1));
}

#[test]
fn case_jump_keeps_sequence_counters() {
    let (mut session, _clock) = controller(Game24Rules);
    deal_with(&mut session, standard_hand());
    let before = (session.state().display_sequence, session.state().next_request_sequence);

    let effects = session.load_case(42);
    let ApiRequest::Next(next) = sent_request(&effects, Endpoint::Next) else {
        panic!("expected a deal");
    };
    assert_eq!(next.case_id, Some(42));
    reply_to(
        &mut session,
        &effects,
        Endpoint::Next,
        json!({"case_id": 42, "values": [1, 2, 3, 4], "seq": 9}),
    );
    assert_eq!(
        (session.state().display_sequence, session.state().next_request_sequence),
        before
    );
    assert_eq!(
        session.state().current_envelope.as_ref().and_then(|e| e.case_id),
        Some(42)
    );
}

#[test]
fn out_of_range_case_is_rejected_locally() {
    let (mut session, _clock) = controller(Game24Rules);
    assert!(session.load_case(1_821).is_empty());
    assert_eq!(session.status().tone, StatusTone::Warning);
    assert!(session.status().text.contains("valid Case ID"));
}

#[test]
fn empty_answer_sends_nothing() {
    let (mut session, _clock) = controller(Game24Rules);
    deal_with(&mut session, standard_hand());
    assert!(session.submit_answer("   ").is_empty());
    assert_eq!(session.status().tone, StatusTone::Warning);
    assert!(session.status().text.to_lowercase().contains("please enter a value"));
    assert_eq!(session.outstanding_requests(), 0);
    assert_eq!(session.stats().played, 0);
}

#[test]
fn submit_without_puzzle_is_a_no_op() {
    let (mut session, _clock) = controller(Game24Rules);
    assert!(session.submit_answer("1+2").is_empty());
    assert!(session.status().is_empty());
}

#[test]
fn custom_pool_ends_without_dealing() {
    let (mut session, _clock) = controller(Game24Rules);
    assert!(session.set_mode(PlayMode::CustomPool).is_empty());
    assert_eq!(session.state().level, "custom");

    let effects = session.save_pool("1, 2 3", None);
    let ApiRequest::Pool(pool) = sent_request(&effects, Endpoint::Pool) else {
        panic!("expected a pool request");
    };
    assert_eq!(pool.case_ids, vec![1, 2, 3]);
    reply_to(&mut session, &effects, Endpoint::Pool, json!({"ok": true, "count": 3}));
    assert_eq!(
        session.status().text,
        "Pool saved (3 case IDs) for custom. Press Deal to start."
    );

    let mut effects = session.deal(true, None);
    for case_id in 1..=3u32 {
        let body = json!({
            "case_id": case_id,
            "values": [case_id, 1, 1, 1],
            "seq": case_id,
            "pool_info": {"remaining": 3 - case_id, "total_count": 3}
        });
        reply_to(&mut session, &effects, Endpoint::Next, body);
        let check = session.submit_answer("1");
        effects = reply_to(&mut session, &check, Endpoint::Check, json!({"ok": true}));
        if case_id < 3 {
            let (token, _) = effects.scheduled().expect("next pooled deal armed");
            assert_eq!(session.pending_action(), Some(ScheduledAction::DealNext));
            effects = session.fire_scheduled(token);
        }
    }

    assert_eq!(session.state().phase, Phase::PoolComplete);
    assert!(!effects.iter().any(|e| e.sends_to(Endpoint::Next)));
    assert!(effects.iter().any(|e| e.sends_to(Endpoint::Summary)));
    assert_eq!(session.pending_action(), Some(ScheduledAction::ReturnToSingle));
    let (token, delay) = effects.scheduled().expect("return armed");
    assert_eq!(delay, 2_000);
    assert_eq!(session.status().text, "Pool completed! Returning to easy mode.");

    let effects = session.fire_scheduled(token);
    let ApiRequest::Pool(off) = sent_request(&effects, Endpoint::Pool) else {
        panic!("expected pool off");
    };
    assert_eq!(off.mode.as_str(), "off");
    assert_eq!(session.state().mode, PlayMode::Single);
    assert_eq!(session.state().level, "easy");
    assert_eq!(session.state().phase, Phase::Idle);
    assert!(!effects.iter().any(|e| e.sends_to(Endpoint::Next)));
}

#[test]
fn competition_over_short_circuits_to_summary() {
    let (mut session, _clock) = controller(Game24Rules);
    session.set_mode(PlayMode::Competition);
    let effects = session.save_pool("5 6", Some(2));
    let ApiRequest::Pool(pool) = sent_request(&effects, Endpoint::Pool) else {
        panic!("expected a pool request");
    };
    assert_eq!(pool.duration_sec, Some(120));
    reply_to(&mut session, &effects, Endpoint::Pool, json!({"ok": true}));
    assert!(session.help_disabled());

    let effects = session.deal(true, None);
    let ticket = effects.ticket_for(Endpoint::Next).unwrap();
    let effects = session.handle_reply(
        ticket,
        Ok(HttpReply::new(
            403,
            json!({"error": "Competition over", "competition_over": true}),
        )),
    );
    assert!(session.state().session_ended);
    assert_eq!(session.state().phase, Phase::Ended);
    assert!(effects.iter().any(|e| e.sends_to(Endpoint::Summary)));
    assert!(session.deal(true, None).is_empty());

    reply_to(
        &mut session,
        &effects,
        Endpoint::Summary,
        json!({"ok": true, "play_summary": {"totals": {"solved": 2}}}),
    );
    assert_eq!(
        session.summary().and_then(|s| s.play_summary.as_ref()).map(|p| p.totals.solved),
        Some(2)
    );
}

#[test]
fn competition_countdown_expires() {
    let (mut session, clock) = controller(Game24Rules);
    session.set_mode(PlayMode::Competition);
    let effects = session.save_pool("5", Some(1));
    reply_to(&mut session, &effects, Endpoint::Pool, json!({"ok": true, "time_left": 60}));
    assert!(session.tick().is_empty());
    clock.advance(61_000);
    let effects = session.tick();
    assert!(effects.iter().any(|e| e.sends_to(Endpoint::Summary)));
    assert!(session.state().session_ended);
    assert!(session.tick().is_empty());
}

#[test]
fn hints_are_blocked_in_competition() {
    let (mut session, _clock) = controller(Game24Rules);
    session.set_mode(PlayMode::Competition);
    let effects = session.save_pool("5", None);
    reply_to(&mut session, &effects, Endpoint::Pool, json!({"ok": true}));
    deal_with(
        &mut session,
        json!({"case_id": 5, "values": [1, 2, 3, 4], "help_disabled": true}),
    );
    assert!(session.request_hint(false).is_empty());
    assert_eq!(session.status().text, "Help is disabled in competition mode.");
    assert_eq!(session.stats().revealed, 0);
}

#[test]
fn skip_waits_for_reply_before_dealing() {
    let (mut session, _clock) = controller(Game24Rules);
    deal_with(&mut session, standard_hand());

    let effects = session.skip();
    assert!(effects.iter().any(|e| e.sends_to(Endpoint::Skip)));
    assert!(!effects.iter().any(|e| e.sends_to(Endpoint::Next)));
    assert!(session.deal(true, None).is_empty(), "deal is locked during skip");

    let ticket = effects.ticket_for(Endpoint::Skip).unwrap();
    let effects = session.handle_reply(
        ticket,
        Err(TransportError::Network("offline".to_string())),
    );
    assert!(effects.iter().any(|e| e.sends_to(Endpoint::Next)));
    assert_eq!(session.stats().skipped, 0);

    reply_to(&mut session, &effects, Endpoint::Next, standard_hand());
    let effects = session.skip();
    reply_to(&mut session, &effects, Endpoint::Skip, json!({"ok": true}));
    assert_eq!(session.stats().skipped, 1);
}

#[test]
fn failed_check_leaves_the_play_unclaimed() {
    let (mut session, _clock) = controller(Game24Rules);
    deal_with(&mut session, standard_hand());

    let effects = session.submit_answer("(9-5)*3*2");
    let ticket = effects.ticket_for(Endpoint::Check).unwrap();
    session.handle_reply(ticket, Err(TransportError::Network("offline".to_string())));
    assert_eq!(session.status().tone, StatusTone::Error);
    assert_eq!(session.stats().played, 0);
    assert_eq!(session.state().phase, Phase::Playing);

    let effects = session.submit_answer("(9-5)*3*2");
    reply_to(&mut session, &effects, Endpoint::Check, json!({"ok": true}));
    assert_eq!(session.stats().played, 1);
    assert_eq!(session.stats().solved, 1);
}

#[test]
fn failed_help_leaves_the_reveal_unclaimed() {
    let (mut session, _clock) = controller(Game24Rules);
    deal_with(&mut session, standard_hand());

    let effects = session.request_hint(false);
    let ticket = effects.ticket_for(Endpoint::Help).unwrap();
    session.handle_reply(ticket, Ok(HttpReply::new(500, json!({}))));
    assert_eq!(session.status().text, "Failed to load help: HTTP 500");
    assert_eq!((session.stats().played, session.stats().revealed), (0, 0));

    let effects = session.request_hint(false);
    reply_to(
        &mut session,
        &effects,
        Endpoint::Help,
        json!({"has_solution": true, "solutions": ["(9-5)*3*2"]}),
    );
    assert_eq!((session.stats().played, session.stats().revealed), (1, 1));
}

fn pooled_skip_in_flight() -> (Controller<Game24Rules>, Vec<Effect>) {
    let (mut session, _clock) = controller(Game24Rules);
    session.set_mode(PlayMode::CustomPool);
    let effects = session.save_pool("3 4", None);
    reply_to(&mut session, &effects, Endpoint::Pool, json!({"ok": true}));
    deal_with(&mut session, json!({"case_id": 3, "values": [1, 2, 3, 4]}));
    let skip = session.skip();
    assert!(skip.iter().any(|e| e.sends_to(Endpoint::Skip)));
    (session, skip)
}

#[test]
fn skip_settling_after_leaving_the_pool_does_not_deal() {
    let (mut session, skip) = pooled_skip_in_flight();
    session.set_mode(PlayMode::Single);
    assert_eq!(session.state().phase, Phase::Idle);

    let effects = reply_to(&mut session, &skip, Endpoint::Skip, json!({"ok": true}));
    assert!(!effects.iter().any(|e| e.sends_to(Endpoint::Next)));
    assert_eq!(session.state().phase, Phase::Idle);
    assert_eq!(session.stats().skipped, 1);
    assert!(!session.state().deal_in_flight);
}

#[test]
fn skip_settling_after_a_pool_save_does_not_deal() {
    let (mut session, skip) = pooled_skip_in_flight();
    let save = session.save_pool("5 6", None);
    assert!(save.iter().any(|e| e.sends_to(Endpoint::Pool)));

    let effects = reply_to(&mut session, &skip, Endpoint::Skip, json!({"ok": true}));
    assert!(effects.is_empty());
    assert_eq!(session.state().phase, Phase::Idle);

    reply_to(&mut session, &save, Endpoint::Pool, json!({"ok": true, "count": 2}));
    let effects = session.deal(true, None);
    assert!(effects.iter().any(|e| e.sends_to(Endpoint::Next)));
}

#[test]
fn skip_settling_after_exit_does_not_deal() {
    let (mut session, _clock) = controller(Game24Rules);
    deal_with(&mut session, standard_hand());
    let skip = session.skip();
    let exit = session.exit();

    let effects = reply_to(&mut session, &skip, Endpoint::Skip, json!({"ok": true}));
    assert!(effects.is_empty());
    assert_eq!(session.state().phase, Phase::Ended);

    let effects = reply_to(&mut session, &exit, Endpoint::Exit, json!({"ok": true}));
    assert!(matches!(effects.as_slice(), [Effect::Navigate { .. }]));
}

#[test]
fn restart_is_idempotent_and_redeals() {
    let (mut session, _clock) = controller(Game24Rules);
    deal_with(&mut session, standard_hand());
    let effects = session.submit_answer("(9-5)*3*2");
    let effects = reply_to(&mut session, &effects, Endpoint::Check, json!({"ok": true}));
    assert!(session.is_advance_pending());
    let (stale_token, _) = effects.scheduled().unwrap();

    let effects = session.restart_session();
    assert!(effects.iter().any(|e| matches!(e, Effect::Cancel { .. })));
    assert!(effects.iter().any(|e| e.sends_to(Endpoint::Restart)));
    assert!(session.restart_session().is_empty());
    assert_eq!(session.stats().solved, 0);
    assert!(session.state().current_envelope.is_none());
    assert!(session.fire_scheduled(stale_token).is_empty());

    let effects = reply_to(&mut session, &effects, Endpoint::Restart, json!({}));
    assert!(effects.iter().any(|e| e.sends_to(Endpoint::Next)));
    reply_to(&mut session, &effects, Endpoint::Next, standard_hand());
    let first = session.state().clone();

    let effects = session.restart_session();
    let effects = reply_to(&mut session, &effects, Endpoint::Restart, json!({}));
    reply_to(&mut session, &effects, Endpoint::Next, standard_hand());
    assert_eq!(session.state(), &first);
}

#[test]
fn stale_replies_are_dropped() {
    let (mut session, _clock) = controller(Game24Rules);
    deal_with(&mut session, standard_hand());
    let check = session.submit_answer("(9-5)*3*2");

    let skip = session.skip();
    let effects = reply_to(&mut session, &skip, Endpoint::Skip, json!({"ok": true}));
    reply_to(&mut session, &effects, Endpoint::Next, json!({"case_id": 9, "values": [4, 4, 4, 4]}));

    let late = reply_to(&mut session, &check, Endpoint::Check, json!({"ok": true}));
    assert!(late.is_empty());
    assert_eq!(session.stats().solved, 0);
    assert_eq!(session.state().phase, Phase::Playing);
}

#[test]
fn leaving_a_pool_goes_idle_without_dealing() {
    let (mut session, _clock) = controller(Game24Rules);
    session.set_mode(PlayMode::CustomPool);
    let effects = session.save_pool("3 4", None);
    reply_to(&mut session, &effects, Endpoint::Pool, json!({"ok": true}));
    deal_with(&mut session, json!({"case_id": 3, "values": [1, 2, 3, 4]}));

    let effects = session.set_mode(PlayMode::Single);
    let ApiRequest::Pool(off) = sent_request(&effects, Endpoint::Pool) else {
        panic!("expected pool off");
    };
    assert!(off.case_ids.is_empty());
    assert!(!effects.iter().any(|e| e.sends_to(Endpoint::Next)));
    assert_eq!(session.state().phase, Phase::Idle);
    assert!(session.state().current_envelope.is_none());
    assert!(!session.pool().is_active());

    let ticket = effects.ticket_for(Endpoint::Pool).unwrap();
    let swallowed = session.handle_reply(ticket, Err(TransportError::Network("down".into())));
    assert!(swallowed.is_empty());
    assert_eq!(session.status().tone, StatusTone::Info);
}

#[test]
fn difficulty_level_while_pooled_keeps_level() {
    let (mut session, _clock) = controller(Game24Rules);
    session.set_level("custom");
    assert_eq!(session.state().mode, PlayMode::CustomPool);
    let effects = session.save_pool("3", None);
    reply_to(&mut session, &effects, Endpoint::Pool, json!({"ok": true}));

    let effects = session.set_level("hard");
    assert!(effects.iter().any(|e| e.sends_to(Endpoint::Pool)));
    assert_eq!(session.state().mode, PlayMode::Single);
    assert_eq!(session.state().level, "hard");
}

#[test]
fn failed_deal_clears_the_table() {
    let (mut session, _clock) = controller(Game24Rules);
    deal_with(&mut session, standard_hand());
    let effects = session.deal(true, None);
    assert!(session.state().current_envelope.is_none());
    let ticket = effects.ticket_for(Endpoint::Next).unwrap();
    session.handle_reply(ticket, Ok(HttpReply::new(500, json!({}))));
    assert!(session.state().current_envelope.is_none());
    assert_eq!(session.state().phase, Phase::Idle);
    assert_eq!(session.status().text, "Failed to get a new question: HTTP 500");
    assert!(!session.state().deal_in_flight);

    let effects = session.deal(true, None);
    let ticket = effects.ticket_for(Endpoint::Next).unwrap();
    session.handle_reply(ticket, Ok(HttpReply::new(404, json!({"error": "No puzzles left"}))));
    assert_eq!(session.status().text, "No puzzles left");
}

#[test]
fn solve_time_is_accumulated_once() {
    let (mut session, clock) = controller(Game24Rules);
    deal_with(&mut session, standard_hand());
    clock.advance(5_500);
    let effects = session.submit_answer("(9-5)*3*2");
    reply_to(&mut session, &effects, Endpoint::Check, json!({"ok": true}));
    assert_eq!(session.stats().total_time_seconds, 5);

    clock.advance(10_000);
    let effects = session.exit();
    let ApiRequest::Exit(exit) = sent_request(&effects, Endpoint::Exit) else {
        panic!("expected exit");
    };
    assert_eq!(exit.stats.total_time_seconds, 5);
}

#[test]
fn exit_navigates_once() {
    let (mut session, _clock) = controller(Game24Rules);
    let effects = session.exit();
    assert!(session.exit().is_empty());
    let effects = reply_to(
        &mut session,
        &effects,
        Endpoint::Exit,
        json!({"ok": true, "redirect_url": "/home"}),
    );
    assert_eq!(effects, vec![Effect::Navigate { url: "/home".to_string() }]);
    assert!(session.deal(true, None).is_empty());
}

#[test]
fn running_sum_reveals_group_by_group() {
    let (mut session, _clock) = controller(RunningSumRules);
    deal_with(
        &mut session,
        json!({
            "case_id": 3,
            "values": [3, 4, 5, 6],
            "seq": 1,
            "reveal": {"init_reveal": [0], "groups": [[1], [2], [3]]}
        }),
    );
    assert_eq!(session.reveal().visible_indices(), vec![0]);
    assert_eq!(session.view().formula.as_deref(), Some("3 = ?"));

    let effects = session.submit_answer("3");
    let ApiRequest::Check(check) = sent_request(&effects, Endpoint::Check) else {
        panic!("expected check");
    };
    assert_eq!(check.step, Some(0));
    assert_eq!(check.target, None);
    reply_to(&mut session, &effects, Endpoint::Check, json!({"ok": true}));
    assert_eq!(session.state().reveal_step, 1);
    assert_eq!(session.status().text, "👍 Keep going…");

    let effects = session.submit_answer("10");
    reply_to(&mut session, &effects, Endpoint::Check, json!({"ok": false, "expected": 7}));
    assert_eq!(session.state().reveal_step, 1);
    assert_eq!(session.status().text, "❌ Expected 7.");

    let mut last_step = session.state().reveal_step;
    for total in ["7", "12"] {
        let effects = session.submit_answer(total);
        reply_to(&mut session, &effects, Endpoint::Check, json!({"ok": true}));
        assert!(session.state().reveal_step > last_step);
        last_step = session.state().reveal_step;
    }
    assert_eq!(last_step, 3);

    let effects = session.submit_answer("18");
    let effects = reply_to(&mut session, &effects, Endpoint::Check, json!({"ok": true}));
    assert_eq!(session.state().phase, Phase::Finishing);
    assert_eq!(session.status().text, "3+4+5+6 = 18");
    let ApiRequest::Finish(finish) = sent_request(&effects, Endpoint::Finish) else {
        panic!("expected finish");
    };
    assert_eq!(finish.answer, 18);

    let effects = reply_to(&mut session, &effects, Endpoint::Finish, json!({"ok": true}));
    assert_eq!(session.state().phase, Phase::Solved);
    assert_eq!(session.stats().solved, 1);
    assert_eq!(session.stats().played, 1);
    assert_eq!(effects.scheduled().map(|(_, delay)| delay), Some(400));
}

#[test]
fn auto_advance_toggle_cancels_pending_deal() {
    let (mut session, _clock) = controller(Game24Rules);
    deal_with(&mut session, standard_hand());
    let effects = session.submit_answer("(9-5)*3*2");
    let effects = reply_to(&mut session, &effects, Endpoint::Check, json!({"ok": true}));
    let (token, _) = effects.scheduled().unwrap();
    let cancel = session.set_auto_advance(false);
    assert_eq!(cancel, vec![Effect::Cancel { token }]);
    assert!(!session.is_advance_pending());
    assert!(session.fire_scheduled(token).is_empty());
}
