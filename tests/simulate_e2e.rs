use coordgame::{
    single_round_probability, DispatchMode, ExtractionStatus, FnProvider, GameParameters,
    GameState, GenerationRequest, ScriptedProvider, Simulator, SimulatorConfig, Verbosity,
};

fn quiet_config() -> SimulatorConfig {
    let mut config = SimulatorConfig::default();
    config.run.verbosity = Verbosity::None;
    config
}

#[test]
fn three_participants_hit_nine_in_one_round() {
    let params = GameParameters::new(3, 5, 9, 1).unwrap();
    let provider = ScriptedProvider::from_rounds([[
        "<answer>3</answer>",
        "I'll say <answer>3",
        "Probably 3",
    ]]);
    let mut sim = Simulator::new(params, quiet_config(), provider).unwrap();

    let outcome = sim.run().unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.rounds_played, 1);

    let round = &sim.history().rounds()[0];
    assert_eq!(round.total(), 9);
    let statuses: Vec<ExtractionStatus> = round.turns().iter().map(|t| t.status).collect();
    assert_eq!(
        statuses,
        vec![
            ExtractionStatus::ExactTag,
            ExtractionStatus::PartialTag,
            ExtractionStatus::UntaggedLastNumber,
        ]
    );
}

#[test]
fn unreachable_target_is_exhausted_regardless_of_guesses() {
    assert_eq!(single_round_probability(2, 1, 5).unwrap(), 0.0);

    let params = GameParameters::new(2, 1, 5, 4).unwrap();
    // Out-of-range answers clamp to K = 1, so the sum never exceeds 2.
    let provider = FnProvider::new("greedy", |_: &GenerationRequest<'_>| {
        Ok("<answer>1000</answer>".to_string())
    });
    let mut sim = Simulator::new(params, quiet_config(), provider).unwrap();

    let outcome = sim.run().unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.state, GameState::Exhausted);
    assert_eq!(outcome.rounds_played, 4);
    assert!(sim.history().rounds().iter().all(|r| r.total() == 2));
}

#[test]
fn participants_adapt_to_history_and_converge() {
    // Each participant answers target minus what the others said last round,
    // split evenly; converges on the second round.
    let params = GameParameters::new(2, 10, 8, 5).unwrap();
    let provider = FnProvider::new("adaptive", |req: &GenerationRequest<'_>| {
        if req.prompt.contains("This is the first round.") {
            Ok(format!("Opening with <answer>{}</answer>", req.participant_id))
        } else {
            Ok("Then we need 4 each: <answer>4</answer>".to_string())
        }
    });
    let config = SimulatorConfig {
        strict_tags: true,
        dispatch: DispatchMode::Parallel,
        ..quiet_config()
    };
    let mut sim = Simulator::new(params, config, provider).unwrap();

    let outcome = sim.run().unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.winning_round, Some(2));

    let rounds = sim.history().rounds();
    assert_eq!(rounds[0].guesses(), vec![1, 2]);
    assert_eq!(rounds[1].guesses(), vec![4, 4]);
    assert!(rounds[1].turns()[0].prompt.contains("Round 1: Agent 1: 1, Agent 2: 2"));
}

#[test]
fn unparseable_answers_still_complete_the_round() {
    let params = GameParameters::new(2, 5, 0, 1).unwrap();
    let provider = ScriptedProvider::from_rounds([["no clue", "<answer>maybe</answer>"]]);
    let mut sim = Simulator::new(params, quiet_config(), provider).unwrap();

    let outcome = sim.run().unwrap();
    // Both default to 0, which happens to be the target.
    assert!(outcome.success);
    assert!(sim.history().rounds()[0]
        .turns()
        .iter()
        .all(|t| t.status == ExtractionStatus::NoNumberFound && t.guess == 0));
}
