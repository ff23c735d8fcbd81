//! Dispatch state machine tests
//!
//! Runs emergencies on small fixture cities with recording test doubles for
//! the renderer and prompter.

use std::collections::{HashMap, VecDeque};

use emergency_sim::simulation::{
    CancellationToken, CellKind, City, DispatchController, DispatchPhase, GridModel,
    HouseRegistry, NoticeLevel, Position, Prompter, Renderer, RunOutcome, Snapshot, Tick,
    TriggerRejection,
};

const STATION: Position = Position::new(2, 2);
const HOSPITAL: Position = Position::new(8, 8);
const HOUSE: Position = Position::new(5, 5);

#[derive(Debug, Clone, PartialEq)]
struct Frame {
    truck: Option<Position>,
    ambulance: Option<Position>,
    truck_trail: usize,
    ambulance_trail: usize,
    highlighted: Option<Position>,
}

#[derive(Default)]
struct RecordingRenderer {
    frames: Vec<Frame>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl RecordingRenderer {
    fn cancelling_after(frames: usize, token: CancellationToken) -> Self {
        Self {
            frames: Vec::new(),
            cancel_after: Some((frames, token)),
        }
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, snapshot: &Snapshot<'_>) {
        self.frames.push(Frame {
            truck: snapshot.truck,
            ambulance: snapshot.ambulance,
            truck_trail: snapshot.truck_trail.map_or(0, |trail| trail.len()),
            ambulance_trail: snapshot.ambulance_trail.map_or(0, |trail| trail.len()),
            highlighted: snapshot.highlighted_house,
        });
        if let Some((after, token)) = &self.cancel_after {
            if self.frames.len() == *after {
                token.cancel();
            }
        }
    }
}

#[derive(Default)]
struct TestPrompter {
    medical: bool,
    notices: Vec<(NoticeLevel, String)>,
    confirm_calls: usize,
    cancel_on_notify: Option<CancellationToken>,
    cancel_on_confirm: Option<CancellationToken>,
}

impl TestPrompter {
    fn answering(medical: bool) -> Self {
        Self {
            medical,
            ..Self::default()
        }
    }

    fn saw(&self, message: &str) -> bool {
        self.notices.iter().any(|(_, text)| text.contains(message))
    }
}

impl Prompter for TestPrompter {
    fn notify(&mut self, level: NoticeLevel, _title: &str, message: &str) {
        self.notices.push((level, message.to_string()));
        if let Some(token) = &self.cancel_on_notify {
            token.cancel();
        }
    }

    fn confirm_medical_emergency(&mut self) -> bool {
        self.confirm_calls += 1;
        if let Some(token) = &self.cancel_on_confirm {
            token.cancel();
        }
        self.medical
    }
}

fn city_from(rows: &[&str]) -> City {
    let grid = GridModel::from_rows(rows).unwrap();
    let mut houses = HouseRegistry::new();
    houses.insert("House 1", HOUSE);
    City::from_parts("Testville", grid, houses, STATION, HOSPITAL)
}

fn open_city() -> City {
    city_from(&[
        "..........",
        "..........",
        "..FF......",
        "..FF......",
        "..........",
        ".....HH...",
        ".....HH...",
        "..........",
        "........++",
        "........++",
    ])
}

/// Reference BFS distance in moves under the same drivability rule
fn bfs_distance(grid: &GridModel, start: Position, goal: Position) -> Option<usize> {
    let mut dist = HashMap::from([(start, 0usize)]);
    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        if current == goal {
            return Some(dist[&current]);
        }
        for next in grid.neighbors4(current) {
            let enterable = next == goal || grid.get(next) == Some(CellKind::Road);
            if enterable && !dist.contains_key(&next) {
                dist.insert(next, dist[&current] + 1);
                queue.push_back(next);
            }
        }
    }
    None
}

fn best_bfs_from_block(grid: &GridModel, anchor: Position, goal: Position) -> Option<usize> {
    anchor
        .block()
        .iter()
        .filter_map(|cell| bfs_distance(grid, *cell, goal))
        .min()
}

/// Tick until the run finishes, returning the outcome and number of motion steps
fn run_to_end(
    controller: &mut DispatchController,
    city: &City,
    renderer: &mut RecordingRenderer,
    prompter: &mut TestPrompter,
) -> (RunOutcome, usize) {
    let mut moves = 0;
    for _ in 0..10_000 {
        match controller.tick(city, renderer, prompter) {
            Tick::Finished(outcome) => return (outcome, moves),
            Tick::Moved(_) => moves += 1,
            Tick::Advanced(_) => {}
            Tick::Idle => panic!("controller went idle without finishing"),
        }
    }
    panic!("run did not finish");
}

#[test]
fn test_fire_only_run_returns_truck_home() {
    let city = open_city();
    let mut controller = DispatchController::for_city(&city, CancellationToken::new());
    let mut renderer = RecordingRenderer::default();
    let mut prompter = TestPrompter::answering(false);

    assert_eq!(controller.trigger(&city, "House 1"), Ok(HOUSE));
    assert!(controller.is_run_active());
    assert_eq!(controller.highlighted_house(), Some(HOUSE));

    let (outcome, moves) = run_to_end(&mut controller, &city, &mut renderer, &mut prompter);

    let expected = best_bfs_from_block(&city.grid, STATION, HOUSE).unwrap();
    let report = controller.last_report().unwrap();
    assert_eq!(outcome, RunOutcome::FireHandled);
    assert_eq!(report.truck_path_len, Some(expected + 1));
    assert_eq!(moves, expected + 1);
    assert_eq!(controller.truck_position(), STATION);
    assert!(controller.is_truck_visible());
    assert!(!controller.is_run_active());
    assert_eq!(controller.phase(), DispatchPhase::Idle);
    assert_eq!(controller.highlighted_house(), None);
    assert_eq!(prompter.confirm_calls, 1);
    assert!(prompter.saw("Emergency at House 1 in Testville at (5, 5)."));
    assert!(prompter.saw("Fire emergency handled."));

    // The trail grows one cell per motion frame
    let trail_lengths: Vec<usize> = renderer.frames[..moves].iter().map(|f| f.truck_trail).collect();
    assert_eq!(trail_lengths, (1..=moves).collect::<Vec<_>>());
    assert_eq!(renderer.frames[moves].truck, Some(HOUSE));
    assert_eq!(renderer.frames.last().unwrap().truck, Some(STATION));
}

#[test]
fn test_medical_run_hides_truck_during_ambulance_trip() {
    let city = open_city();
    let mut controller = DispatchController::for_city(&city, CancellationToken::new());
    let mut renderer = RecordingRenderer::default();
    let mut prompter = TestPrompter::answering(true);

    controller.trigger(&city, "House 1").unwrap();
    let (outcome, _) = run_to_end(&mut controller, &city, &mut renderer, &mut prompter);

    assert_eq!(outcome, RunOutcome::PatientDelivered);
    let report = controller.last_report().unwrap();
    let (outbound, back) = report.ambulance_path_lens.unwrap();
    assert_eq!(outbound, best_bfs_from_block(&city.grid, HOSPITAL, HOUSE).unwrap() + 1);
    assert!(back > 0);
    assert!(prompter.saw("Dispatching ambulance to House 1 at (5, 5)."));
    assert!(prompter.saw("Patient reached hospital safely."));

    let ambulance_frames: Vec<&Frame> = renderer
        .frames
        .iter()
        .filter(|frame| frame.ambulance.is_some())
        .collect();
    assert_eq!(ambulance_frames.len(), 1 + outbound + back);
    assert!(ambulance_frames.iter().all(|frame| frame.truck.is_none()));

    let last = renderer.frames.last().unwrap();
    assert_eq!(last.truck, Some(STATION));
    assert_eq!(last.ambulance, None);
    assert_eq!(controller.ambulance_position(), None);
    assert!(controller.is_truck_visible());
    assert!(!controller.is_run_active());
}

#[test]
fn test_second_trigger_is_rejected_while_running() {
    let city = open_city();
    let mut controller = DispatchController::for_city(&city, CancellationToken::new());
    let mut renderer = RecordingRenderer::default();
    let mut prompter = TestPrompter::answering(false);

    controller.trigger(&city, "House 1").unwrap();
    assert_eq!(controller.tick(&city, &mut renderer, &mut prompter), Tick::Advanced(DispatchPhase::TruckEnRoute));
    assert!(matches!(controller.tick(&city, &mut renderer, &mut prompter), Tick::Moved(_)));
    assert!(matches!(controller.tick(&city, &mut renderer, &mut prompter), Tick::Moved(_)));

    let truck = controller.truck_position();
    assert_eq!(
        controller.trigger(&city, "House 1"),
        Err(TriggerRejection::RunAlreadyActive)
    );
    assert_eq!(controller.truck_position(), truck);
    assert_eq!(controller.phase(), DispatchPhase::TruckEnRoute);

    let (outcome, _) = run_to_end(&mut controller, &city, &mut renderer, &mut prompter);
    assert_eq!(outcome, RunOutcome::FireHandled);
}

#[test]
fn test_unknown_house_is_rejected() {
    let city = open_city();
    let mut controller = DispatchController::for_city(&city, CancellationToken::new());

    assert_eq!(
        controller.trigger(&city, "House 99"),
        Err(TriggerRejection::UnknownHouse("House 99".to_string()))
    );
    assert!(!controller.is_run_active());
    assert_eq!(controller.highlighted_house(), None);
}

#[test]
fn test_cancel_mid_motion_stops_within_one_step() {
    let city = open_city();
    let token = CancellationToken::new();
    let mut controller = DispatchController::for_city(&city, token.clone());
    let mut renderer = RecordingRenderer::cancelling_after(2, token.clone());
    let mut prompter = TestPrompter::answering(false);

    controller.trigger(&city, "House 1").unwrap();
    let (outcome, moves) = run_to_end(&mut controller, &city, &mut renderer, &mut prompter);

    assert_eq!(outcome, RunOutcome::Cancelled);
    assert_eq!(moves, 2);
    // two motion frames, then the frame drawn on stopping
    assert_eq!(renderer.frames.len(), 3);
    assert_eq!(Some(controller.truck_position()), renderer.frames[1].truck);
    assert_eq!(renderer.frames[2].truck, renderer.frames[1].truck);
    assert_eq!(renderer.frames[2].highlighted, None);
    assert_eq!(controller.highlighted_house(), None);
    assert_ne!(controller.truck_position(), HOUSE);
    assert!(!controller.is_run_active());
    assert_eq!(controller.phase(), DispatchPhase::Cancelled);
    assert_eq!(prompter.confirm_calls, 0);

    assert_eq!(
        controller.trigger(&city, "House 1"),
        Err(TriggerRejection::AlreadyCancelled)
    );

    controller.reset(city.station.anchor);
    assert!(!token.is_cancelled());
    assert_eq!(controller.trigger(&city, "House 1"), Ok(HOUSE));
    let mut renderer = RecordingRenderer::default();
    let (outcome, _) = run_to_end(&mut controller, &city, &mut renderer, &mut prompter);
    assert_eq!(outcome, RunOutcome::FireHandled);
}

#[test]
fn test_cancel_during_acknowledgement_skips_search() {
    let city = open_city();
    let token = CancellationToken::new();
    let mut controller = DispatchController::for_city(&city, token.clone());
    let mut renderer = RecordingRenderer::default();
    let mut prompter = TestPrompter {
        cancel_on_notify: Some(token.clone()),
        ..TestPrompter::default()
    };

    controller.trigger(&city, "House 1").unwrap();
    assert_eq!(
        controller.tick(&city, &mut renderer, &mut prompter),
        Tick::Finished(RunOutcome::Cancelled)
    );
    assert_eq!(renderer.frames.len(), 1);
    assert_eq!(renderer.frames[0].truck, Some(STATION));
    assert_eq!(renderer.frames[0].highlighted, None);
    assert_eq!(controller.truck_position(), STATION);
    assert!(!controller.is_run_active());
}

#[test]
fn test_cancel_while_asking_about_medical_emergency() {
    let city = open_city();
    let token = CancellationToken::new();
    let mut controller = DispatchController::for_city(&city, token.clone());
    let mut renderer = RecordingRenderer::default();
    let mut prompter = TestPrompter {
        medical: true,
        cancel_on_confirm: Some(token.clone()),
        ..TestPrompter::default()
    };

    controller.trigger(&city, "House 1").unwrap();
    let (outcome, _) = run_to_end(&mut controller, &city, &mut renderer, &mut prompter);

    assert_eq!(outcome, RunOutcome::Cancelled);
    assert_eq!(controller.truck_position(), HOUSE);
    assert_eq!(controller.ambulance_position(), None);
    assert!(!prompter.saw("Dispatching ambulance"));
}

#[test]
fn test_cancel_mid_ambulance_trip_leaves_state_as_is() {
    let city = open_city();
    let token = CancellationToken::new();
    let truck_len = best_bfs_from_block(&city.grid, STATION, HOUSE).unwrap() + 1;
    // truck motion frames, arrival frame, ambulance appears, one ambulance step
    let mut renderer = RecordingRenderer::cancelling_after(truck_len + 3, token.clone());
    let mut controller = DispatchController::for_city(&city, token.clone());
    let mut prompter = TestPrompter::answering(true);

    controller.trigger(&city, "House 1").unwrap();
    let (outcome, moves) = run_to_end(&mut controller, &city, &mut renderer, &mut prompter);

    assert_eq!(outcome, RunOutcome::Cancelled);
    assert_eq!(moves, truck_len + 1);
    assert!(!controller.is_truck_visible());
    assert_eq!(controller.ambulance_position(), renderer.frames.last().unwrap().ambulance);
    assert!(controller.ambulance_position().is_some());
    assert!(!prompter.saw("Patient reached hospital safely."));
}

#[test]
fn test_unreachable_house_fails_without_moving() {
    let city = city_from(&[
        "..........",
        "..........",
        "..FF......",
        "..FF......",
        ".....##...",
        "....#HH#..",
        "....#HH#..",
        ".....##...",
        "........++",
        "........++",
    ]);
    let mut controller = DispatchController::for_city(&city, CancellationToken::new());
    let mut renderer = RecordingRenderer::default();
    let mut prompter = TestPrompter::answering(true);

    controller.trigger(&city, "House 1").unwrap();
    let (outcome, moves) = run_to_end(&mut controller, &city, &mut renderer, &mut prompter);

    assert_eq!(outcome, RunOutcome::NoRouteFound);
    assert_eq!(moves, 0);
    let last = renderer.frames.last().unwrap();
    assert_eq!(last.highlighted, None);
    assert_eq!(last.truck, Some(STATION));
    assert_eq!(controller.truck_position(), STATION);
    assert!(!controller.is_run_active());
    assert_eq!(controller.phase(), DispatchPhase::Idle);
    assert!(prompter
        .notices
        .iter()
        .any(|(level, text)| *level == NoticeLevel::Error && text == "No path to House 1"));

    // A failed run is not a cancellation
    assert_eq!(controller.trigger(&city, "House 1"), Ok(HOUSE));
}

#[test]
fn test_sealed_hospital_degrades_to_fire_only() {
    let city = city_from(&[
        "..........",
        "..........",
        "..FF......",
        "..FF......",
        "..........",
        ".....HH...",
        ".....HH...",
        "........##",
        ".......#++",
        ".......#++",
    ]);
    let mut controller = DispatchController::for_city(&city, CancellationToken::new());
    let mut renderer = RecordingRenderer::default();
    let mut prompter = TestPrompter::answering(true);

    controller.trigger(&city, "House 1").unwrap();
    let (outcome, _) = run_to_end(&mut controller, &city, &mut renderer, &mut prompter);

    assert_eq!(outcome, RunOutcome::AmbulanceRouteUnavailable);
    assert!(renderer.frames.iter().all(|frame| frame.ambulance.is_none()));
    assert!(renderer.frames.iter().all(|frame| frame.truck.is_some()));
    assert_eq!(controller.truck_position(), STATION);
    assert!(!controller.is_run_active());
}

#[test]
fn test_highlight_follows_the_run() {
    let city = open_city();
    let mut controller = DispatchController::for_city(&city, CancellationToken::new());
    let mut renderer = RecordingRenderer::default();
    let mut prompter = TestPrompter::answering(false);

    controller.trigger(&city, "House 1").unwrap();
    run_to_end(&mut controller, &city, &mut renderer, &mut prompter);

    let (last, motion) = renderer.frames.split_last().unwrap();
    assert!(motion.iter().all(|frame| frame.highlighted == Some(HOUSE)));
    assert_eq!(last.highlighted, None);
}
