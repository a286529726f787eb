use coordgame::{
    ExtractionStatus, GameError, GameParameters, GenerationError, JsonFileSink, LogSink,
    MemorySink, RunLog, ScriptedProvider, SimulationError, Simulator, SimulatorConfig, Verbosity,
};

/// Sink whose storage is always unavailable.
struct FailingSink;

impl LogSink for FailingSink {
    fn write(&self, _log: &RunLog) -> Result<(), SimulationError> {
        Err(SimulationError::Log {
            message: "disk full".to_string(),
        })
    }
}

fn quiet_config() -> SimulatorConfig {
    let mut config = SimulatorConfig::default();
    config.run.verbosity = Verbosity::None;
    config.strict_tags = true;
    config
}

#[test]
fn json_file_sink_writes_every_turn() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run_logs").join("coordination_game_log.json");
    let sink = JsonFileSink::new(&path);

    let params = GameParameters::new(2, 5, 6, 2).unwrap();
    let provider = ScriptedProvider::from_rounds([
        ["<answer>2</answer>", "<answer>2</answer>"],
        ["<answer>3</answer>", "ending with 3</answer>"],
    ]);
    let mut sim = Simulator::new(params, quiet_config(), provider).unwrap();
    let outcome = sim.run_and_persist(&sink).unwrap();
    assert!(outcome.success);

    let json = std::fs::read_to_string(sink.path()).unwrap();
    let log = RunLog::from_json(&json).unwrap();
    assert!(log.success);
    assert_eq!(log.metadata.run_id, sim.run_id());
    assert_eq!(log.metadata.parameters, params);
    assert_eq!(log.metadata.model, "gpt-4o-mini");
    assert_eq!(log.rounds.len(), 2);

    let last = &log.rounds[1].turns()[1];
    assert_eq!(last.participant_id, 2);
    assert_eq!(last.guess, 3);
    assert_eq!(last.status, ExtractionStatus::PartialTag);
    assert_eq!(last.raw_text, "ending with 3</answer>");
    assert!(last.prompt.contains("Round 1: Agent 1: 2, Agent 2: 2"));

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["rounds"][0]["turns"][0]["status"], "exact_tag");
}

#[test]
fn failed_run_is_still_persisted() {
    let sink = MemorySink::new();
    let params = GameParameters::new(1, 5, 5, 3).unwrap();
    let provider = ScriptedProvider::new();
    provider.push(1, "1");
    provider.push_error(1, GenerationError::Other { message: "quota".into() });
    let mut sim = Simulator::new(params, quiet_config(), provider).unwrap();

    let err = sim.run_and_persist(&sink).unwrap_err();
    assert!(err.is_generation());

    let logs = sink.logs();
    assert_eq!(logs.len(), 1);
    assert!(!logs[0].success);
    assert_eq!(logs[0].rounds.len(), 1);
}

#[test]
fn sink_trait_object_accepts_both_sinks() {
    let dir = tempfile::tempdir().unwrap();
    let sinks: Vec<Box<dyn LogSink>> = vec![
        Box::new(MemorySink::new()),
        Box::new(JsonFileSink::new(dir.path().join("log.json"))),
    ];
    let params = GameParameters::new(1, 3, 2, 1).unwrap();
    for sink in &sinks {
        let provider = ScriptedProvider::from_rounds([["2"]]);
        let mut sim = Simulator::new(params, quiet_config(), provider).unwrap();
        assert!(sim.run_and_persist(sink.as_ref()).unwrap().success);
    }
    assert!(dir.path().join("log.json").exists());
}

#[test]
fn run_error_outranks_sink_error() {
    let params = GameParameters::new(2, 5, 4, 1).unwrap();
    let provider = ScriptedProvider::new();
    provider.push(1, "2");
    provider.push_error(2, GenerationError::Other { message: "quota".into() });
    let mut sim = Simulator::new(params, quiet_config(), provider).unwrap();

    let err = sim.run_and_persist(&FailingSink).unwrap_err();
    assert!(err.is_generation());
    assert!(!matches!(err, GameError::Simulation(SimulationError::Log { .. })));
}

#[test]
fn sink_error_surfaces_after_clean_run() {
    let params = GameParameters::new(1, 3, 2, 1).unwrap();
    let provider = ScriptedProvider::from_rounds([["2"]]);
    let mut sim = Simulator::new(params, quiet_config(), provider).unwrap();

    let err = sim.run_and_persist(&FailingSink).unwrap_err();
    assert!(matches!(err, GameError::Simulation(SimulationError::Log { .. })));
    assert!(sim.outcome().success);
}
