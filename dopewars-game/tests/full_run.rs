use dopewars_game::{
    BuiltinData, Commodity, EconomyConfig, GameEngine, GameSession, MarketRng, ReferenceData,
    RunSummary, Trend, check_day_step, check_invariants,
};

/// Buys whatever is trending up, dumps anything trending down, pays the
/// loan whenever cash allows and wanders through every city.
fn play_trend_run(session: &mut GameSession) {
    session.start_game("Trend");
    let cities: Vec<String> = session.cities().iter().map(|c| c.name.clone()).collect();
    let mut step = 0_usize;
    while !session.game_over() {
        for commodity in Commodity::ALL {
            let held = session.player().inventory[commodity];
            if held > 0 && session.market()[commodity].trend == Trend::Down {
                session.sell(commodity, held).unwrap();
            }
        }
        let rising = session
            .market()
            .iter()
            .find(|(_, entry)| entry.trend == Trend::Up)
            .map(|(c, e)| (c, *e));
        if let Some((commodity, entry)) = rising {
            let affordable = session.max_affordable(commodity);
            if affordable > 0 && entry.price > 0 {
                let qty = u32::try_from(affordable.min(50)).unwrap();
                session.buy(commodity, qty).unwrap();
            }
        }
        let payable = session.player().cash.min(session.player().debt);
        if payable > 0 {
            session.pay_debt(payable).unwrap();
        }
        step += 1;
        session.travel(&cities[step % cities.len()]).unwrap();

        let before = session.player().days_left;
        session.next_day();
        assert!(check_day_step(before, session.player().days_left).is_none());
        assert!(check_invariants(&session).is_empty());
    }
}

#[test]
fn seeded_runs_are_reproducible() {
    let mut first = GameSession::with_seed(0xD0_9E);
    let mut second = GameSession::with_seed(0xD0_9E);
    play_trend_run(&mut first);
    play_trend_run(&mut second);
    assert_eq!(first.player(), second.player());
    assert_eq!(
        RunSummary::from_session(&first),
        RunSummary::from_session(&second)
    );
}

#[test]
fn a_full_run_lasts_exactly_thirty_days() {
    let mut session = GameSession::with_seed(77);
    play_trend_run(&mut session);
    let summary = RunSummary::from_session(&session);
    assert!(summary.game_over);
    assert_eq!(summary.days_left, 1);
    assert_eq!(summary.day, 30);
    assert!(summary.debt <= 5_500);
}

#[test]
fn interest_grows_an_untouched_loan() {
    let config = EconomyConfig::default().with_interest(0.1 / 7.0);
    let mut session =
        GameSession::with_config(config, ReferenceData::builtin(), MarketRng::from_user_seed(4))
            .unwrap();
    session.start_game("Idle");
    let mut charged = 0_u64;
    while !session.next_day().is_game_over() {
        charged += session
            .events()
            .latest()
            .map_or(0, |event| u64::from(event.message.contains("Interest added")));
    }
    assert_eq!(charged, 29);
    assert!(session.player().debt > 5_500);
}

#[test]
fn engine_sessions_match_direct_construction() {
    let engine = GameEngine::new(BuiltinData);
    let mut from_engine = engine.create_session(Some(5)).unwrap();
    let mut direct = GameSession::with_seed(5);
    from_engine.start_game("Same");
    direct.start_game("Same");
    assert_eq!(from_engine.market(), direct.market());
}
