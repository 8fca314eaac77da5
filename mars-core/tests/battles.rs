use mars_core::{CoreError, Machine};
use rand::{rngs::StdRng, SeedableRng};
use redcode::{Instruction, Mode, Opcode};

/// A machine with deterministic warrior placement
fn machine(size: usize, allow_single: bool, seed: u64) -> Machine {
    Machine::with_rng(size, allow_single, Box::new(StdRng::seed_from_u64(seed)))
        .unwrap()
}

#[test]
fn an_imp_fills_a_small_core() {
    let mut mars = machine(5, true, 1);
    mars.load_code("MOV 0, 1", "imp").unwrap();

    for _ in 0..5 {
        mars.round();
    }

    let imp = Instruction::new(Opcode::Mov, Mode::Relative, 0, Mode::Relative, 1);
    for index in 0_i64..5 {
        assert_eq!(mars.memory().instruction_at(index), Ok(imp));
    }
    assert_eq!(mars.ticks(), 5);
    assert!(mars.processes().iter().all(|process| process.is_alive()));
}

#[test]
fn relative_jumps_route_a_bomb_backwards() {
    // The warrior fills the whole core, so its layout is fixed:
    //   0: JMP 2   1: DAT #0   2: MOV #2, -1   3: JMP -3
    let mut mars = machine(4, true, 2);
    mars.load_code("JMP 2\nDAT #0\nMOV #2, -1\nJMP -3", "looper")
        .unwrap();
    mars.run(50).unwrap();

    // The MOV wrote through relative -1 into the DAT cell
    assert_eq!(mars.memory().read(1), 2);
    assert_eq!(mars.memory().instruction_at(1), Ok(Instruction::dat(2)));
    assert!(mars.processes().iter().all(|process| process.is_alive()));
}

#[test]
fn indirect_writes_follow_the_pointed_cell() {
    //   0: MOV #2, 5   1: MOV #8, @1   2: DAT #0
    let mut mars = machine(3, true, 3);
    mars.load_code("MOV #2, 5\nMOV #8, @1\nDAT #0", "hopper")
        .unwrap();
    mars.run(50).unwrap();

    assert_eq!(mars.memory().instruction_at(1), Ok(Instruction::dat(8)));
    // The warrior walked into its own data cell and died there
    assert!(mars.halted());
    assert!(!mars.processes().first().unwrap().is_alive());
    assert_eq!(mars.ticks(), 3);
}

#[test]
fn the_dwarf_bombs_every_fourth_cell() {
    let mut mars = machine(128, true, 4);
    mars.load_code("ADD #4, -1\nMOV #0, @-2\nJMP -2", "dwarf")
        .unwrap();
    // A tick budget of 47 runs exactly 48 ticks: 16 full dwarf loops
    mars.run(47).unwrap();
    assert_eq!(mars.ticks(), 48);

    let start = mars.processes().first().unwrap().code_start() as i64;
    // The pointer cell was incremented by 4, 16 times
    assert_eq!(mars.memory().read(start - 1), 64);

    // Every fourth cell from the pointer took a DAT #0, #0 bomb, and the
    // history recorded the bombing run in order
    let bombs: Vec<usize> = mars
        .history()
        .iter()
        .flatten()
        .filter(|diff| diff.value.as_deref() == Some("DAT #0, #0"))
        .filter_map(|diff| diff.index)
        .collect();
    assert_eq!(bombs.len(), 16);
    for (loop_count, index) in bombs.iter().enumerate() {
        let offset = 4 * (loop_count as i64 + 1);
        assert_eq!(*index, mars.memory().wrap(start - 1 + offset));
        assert_eq!(mars.memory().read(start - 1 + offset), 0);
    }
    assert!(mars.processes().iter().all(|process| process.is_alive()));
}

#[test]
fn seeded_twin_machines_replay_identically() {
    let build = |seed| {
        let mut mars = machine(64, false, seed);
        mars.load_code("MOV 0, 1", "imp").unwrap();
        mars.load_code("ADD #4, -1\nMOV #0, @-2\nJMP -2", "dwarf")
            .unwrap();
        mars.run(300).unwrap();
        mars
    };
    let first = build(42);
    let second = build(42);

    assert_eq!(first.memory(), second.memory());
    assert_eq!(first.history(), second.history());
    assert_eq!(first.processes(), second.processes());
    assert_eq!(first.ticks(), second.ticks());
    assert_eq!(first.start_map(), second.start_map());
}

#[test]
fn battles_halt_when_fewer_than_two_warriors_remain() {
    let mut mars = machine(32, false, 5);
    mars.load_code("DAT #0", "stone").unwrap();
    mars.load_code("MOV 0, 1", "imp").unwrap();
    mars.run(100).unwrap();

    // The stone died on the first round, ending the battle immediately
    assert!(mars.halted());
    assert_eq!(mars.alive_count(), 1);
    assert_eq!(mars.ticks(), 2);

    let before = mars.history().len();
    mars.round();
    assert_eq!(mars.history().len(), before, "halted rounds are no-ops");
}

#[test]
fn the_start_state_preserves_the_launch_layout() {
    let mut mars = machine(64, true, 6);
    mars.load_code("ADD #4, -1\nMOV #0, @-2\nJMP -2", "dwarf")
        .unwrap();
    mars.run(30).unwrap();

    let snapshot = mars.start_state().unwrap();
    let start = snapshot.processes.first().unwrap().code_start();
    assert_eq!(
        snapshot.memory.render(start as i64),
        "ADD #4, -1",
        "the snapshot keeps the unbombed core"
    );
    assert_eq!(snapshot.processes.first().map(|p| p.ip()), Some(start));
    // The live machine has mutated away from the snapshot
    assert_ne!(&snapshot.memory, mars.memory());
    assert_ne!(
        snapshot.processes.first().map(|p| p.ip()),
        mars.processes().first().map(|p| p.ip())
    );
}

#[test]
fn warriors_load_from_files() {
    let path = std::env::temp_dir()
        .join(format!("imp-warrior-{}.red", std::process::id()));
    std::fs::write(&path, "MOV 0, 1 ; the classic\n").unwrap();

    let mut mars = machine(8, true, 7);
    mars.load_file(&path, "imp").unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(mars.processes().len(), 1);

    let missing = mars.load_file("/no/such/warrior.red", "ghost");
    assert!(matches!(missing, Err(CoreError::Io(_))));
}

#[test]
fn exports_render_as_json() {
    let mut mars = machine(4, true, 8);
    mars.load_code("JMP 2\nDAT #0\nMOV #2, -1\nJMP -3", "looper")
        .unwrap();
    mars.run(2).unwrap();

    let history = mars.history_json().unwrap();
    assert!(history.starts_with('['));
    assert!(history.contains("\"pid\":0"));

    let rendered = mars.memory().render_json().unwrap();
    assert!(rendered.contains("\"JMP #0, 2\""));
    assert!(rendered.contains("\"MOV #2, -1\""));
}
