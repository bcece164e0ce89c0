//! Scripted player for headless runs.
//!
//! The autopilot reads the session each frame and produces the input a
//! diligent player would: walk to the next lesson, answer every question
//! correctly, fight whatever it bumps into and move on when an area is
//! done. It drives smoke runs and end-to-end tests.

use cloudquest_common::Vec2;
use cloudquest_gameplay::{
    education, stations, Action, CombatState, GameMode, GameSession, InputSnapshot,
    LearningPhase, LearningSession, PRACTICAL_COMPLETE,
};
use tracing::debug;

/// Distance under which an axis counts as reached.
const AXIS_DEADZONE: f32 = 4.0;

/// Frames without progress before a detour is taken.
const STUCK_FRAMES: u32 = 12;

/// Seconds a detour lasts.
const DETOUR_SECONDS: f32 = 0.6;

/// Health fraction under which the autopilot flees.
const FLEE_HEALTH: f32 = 0.25;

/// Movement nudge taken while stuck.
#[derive(Debug, Clone, Copy)]
struct Detour {
    direction: Vec2,
    remaining: f32,
}

/// Produces one [`InputSnapshot`] per frame from the session state.
#[derive(Debug)]
pub struct Autopilot {
    rng: fastrand::Rng,
    last_position: Option<Vec2>,
    stuck_frames: u32,
    detour: Option<Detour>,
}

impl Autopilot {
    /// Creates an autopilot whose detours come from `rng`.
    #[must_use]
    pub fn new(rng: fastrand::Rng) -> Self {
        Self {
            rng,
            last_position: None,
            stuck_frames: 0,
            detour: None,
        }
    }

    /// Input for the next frame.
    pub fn next_input(&mut self, session: &GameSession, dt: f32) -> InputSnapshot {
        match session.mode() {
            GameMode::Paused => InputSnapshot::new().with_pressed(Action::MenuToggle),
            GameMode::Learning => session
                .learning()
                .map_or_else(InputSnapshot::new, learning_input),
            GameMode::Combat => combat_input(session),
            GameMode::Exploring => self.exploring_input(session, dt),
        }
    }

    /// Level worth travelling to once the current one has nothing left to
    /// learn.
    #[must_use]
    pub fn destination(&self, session: &GameSession) -> Option<&'static str> {
        if session.mode() != GameMode::Exploring || next_station(session).is_some() {
            return None;
        }
        let current = session.levels().current().id();
        session
            .progression()
            .available_levels()
            .into_iter()
            .filter(|id| *id != current && session.levels().get(id).is_some())
            .find_map(|id| {
                let layout = stations::layout(id)?;
                layout
                    .stations
                    .iter()
                    .any(|s| !session.player().knows(s.concept_id))
                    .then_some(layout.level_id)
            })
    }

    /// Whether every concept in the catalog has been learned.
    #[must_use]
    pub fn is_finished(session: &GameSession) -> bool {
        education::concepts()
            .iter()
            .all(|c| session.player().knows(c.id))
    }

    fn exploring_input(&mut self, session: &GameSession, dt: f32) -> InputSnapshot {
        let center = session.player().center();
        let radius = session.settings().station_radius;

        let target = match next_station(session) {
            Some(station) if station.distance(center) <= radius => {
                self.reset_progress();
                return InputSnapshot::new().with_pressed(Action::Interact);
            },
            Some(station) => Some(station),
            None => session
                .enemies()
                .iter()
                .map(|e| e.center())
                .min_by(|a, b| a.distance(center).total_cmp(&b.distance(center))),
        };

        let Some(target) = target else {
            self.reset_progress();
            return InputSnapshot::new();
        };

        let direction = self.steer(center, target, dt);
        movement_input(direction)
    }

    fn steer(&mut self, center: Vec2, target: Vec2, dt: f32) -> Vec2 {
        if let Some(detour) = &mut self.detour {
            detour.remaining -= dt;
            if detour.remaining > 0.0 {
                return detour.direction;
            }
            self.detour = None;
        }

        let moved = self
            .last_position
            .map_or(f32::MAX, |last| last.distance(center));
        self.last_position = Some(center);
        if moved < 0.5 {
            self.stuck_frames += 1;
        } else {
            self.stuck_frames = 0;
        }

        let mut wanted = target - center;
        if wanted.x.abs() <= AXIS_DEADZONE {
            wanted.x = 0.0;
        }
        if wanted.y.abs() <= AXIS_DEADZONE {
            wanted.y = 0.0;
        }
        if self.stuck_frames >= STUCK_FRAMES {
            self.stuck_frames = 0;
            // Slide along whichever axis is not blocked, or back off
            let direction = match self.rng.u8(0..3) {
                0 => Vec2::new(0.0, if self.rng.bool() { 1.0 } else { -1.0 }),
                1 => Vec2::new(if self.rng.bool() { 1.0 } else { -1.0 }, 0.0),
                _ => Vec2::new(-wanted.x.signum(), -wanted.y.signum()),
            };
            debug!("Autopilot stuck at {:?}, detouring {:?}", center, direction);
            self.detour = Some(Detour {
                direction,
                remaining: DETOUR_SECONDS,
            });
            return direction;
        }
        wanted
    }

    fn reset_progress(&mut self) {
        self.last_position = None;
        self.stuck_frames = 0;
        self.detour = None;
    }
}

/// Centre of the closest station the player can learn from right now.
fn next_station(session: &GameSession) -> Option<Vec2> {
    let center = session.player().center();
    let learned = session.player().learned_concepts();
    session
        .stations()
        .all()
        .iter()
        .filter(|s| !session.player().knows(s.concept_id))
        .filter(|s| {
            education::concept(s.concept_id)
                .is_some_and(|c| education::prerequisites_met(c, learned))
        })
        .map(|s| s.position)
        .min_by(|a, b| a.distance(center).total_cmp(&b.distance(center)))
}

fn movement_input(direction: Vec2) -> InputSnapshot {
    let mut input = InputSnapshot::new();
    input.set_held(Action::MoveRight, direction.x > 0.0);
    input.set_held(Action::MoveLeft, direction.x < 0.0);
    input.set_held(Action::MoveDown, direction.y > 0.0);
    input.set_held(Action::MoveUp, direction.y < 0.0);
    input
}

fn learning_input(learning: &LearningSession) -> InputSnapshot {
    let input = InputSnapshot::new();
    match learning.phase() {
        LearningPhase::Quiz if learning.answer(learning.page()).is_none() => {
            let Some(question) = learning.current_question() else {
                return input.with_pressed(Action::Interact);
            };
            choose(input, learning.selected_option(), question.correct)
        },
        LearningPhase::Practical if !learning.practical_completed() => {
            choose(input, learning.selected_option(), PRACTICAL_COMPLETE)
        },
        _ => input.with_pressed(Action::Interact),
    }
}

/// Moves the highlight to `wanted`, then confirms and advances.
fn choose(input: InputSnapshot, selected: usize, wanted: usize) -> InputSnapshot {
    if selected < wanted {
        input.with_pressed(Action::MoveDown)
    } else if selected > wanted {
        input.with_pressed(Action::MoveUp)
    } else {
        input
            .with_pressed(Action::Confirm)
            .with_pressed(Action::Interact)
    }
}

fn combat_input(session: &GameSession) -> InputSnapshot {
    let combat = session.combat();
    if combat.state() != Some(CombatState::PlayerTurn) {
        return InputSnapshot::new();
    }

    let player = session.player();
    let health = player.health() as f32 / player.max_health().max(1) as f32;
    if health < FLEE_HEALTH {
        return InputSnapshot::new().with_pressed(Action::Cancel);
    }

    let ready = combat
        .abilities()
        .get(combat.selected_index())
        .is_some_and(|a| a.is_ready());
    if ready {
        InputSnapshot::new().with_pressed(Action::Confirm)
    } else {
        InputSnapshot::new().with_pressed(Action::MoveDown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudquest_gameplay::{CloudEnemy, EnemyKind, GameSettings};

    const DT: f32 = 1.0 / 60.0;

    fn calm_settings() -> GameSettings {
        GameSettings {
            encounter_grace: 1.0e6,
            ..GameSettings::default()
        }
    }

    #[test]
    fn test_paused_presses_menu() {
        let mut session = GameSession::new(calm_settings(), fastrand::Rng::with_seed(1));
        session.update(&InputSnapshot::new().with_pressed(Action::MenuToggle), DT);
        assert_eq!(session.mode(), GameMode::Paused);

        let mut pilot = Autopilot::new(fastrand::Rng::with_seed(1));
        let input = pilot.next_input(&session, DT);
        assert!(input.is_just_pressed(Action::MenuToggle));
        session.update(&input, DT);
        assert_eq!(session.mode(), GameMode::Exploring);
    }

    #[test]
    fn test_heads_toward_first_station() {
        let session = GameSession::new(calm_settings(), fastrand::Rng::with_seed(1));
        let mut pilot = Autopilot::new(fastrand::Rng::with_seed(1));
        let target = next_station(&session).expect("a station to learn");
        let input = pilot.next_input(&session, DT);
        let center = session.player().center();
        assert_eq!(input.is_held(Action::MoveRight), target.x - center.x > AXIS_DEADZONE);
        assert_eq!(input.is_held(Action::MoveDown), target.y - center.y > AXIS_DEADZONE);
    }

    #[test]
    fn test_completes_a_lesson() {
        let mut session = GameSession::new(calm_settings(), fastrand::Rng::with_seed(2));
        session.enemies_mut().clear_all();
        let station = session
            .stations()
            .find("ec2_basics")
            .expect("ec2 station")
            .position;
        let half = session.player().center() - session.player().position();
        session.player_mut().set_position(station - half);

        let mut pilot = Autopilot::new(fastrand::Rng::with_seed(2));
        let mut started = false;
        for _ in 0..200 {
            let input = pilot.next_input(&session, DT);
            session.update(&input, DT);
            if session.mode() == GameMode::Learning {
                started = true;
            }
            if started && session.mode() == GameMode::Exploring {
                break;
            }
        }

        assert!(started);
        assert_eq!(session.mode(), GameMode::Exploring);
        assert!(session.player().knows("ec2_basics"));
        assert!(session.tracker().has_achievement("perfect_score"));
    }

    #[test]
    fn test_fights_to_the_end() {
        let settings = GameSettings {
            encounter_grace: 0.0,
            ..GameSettings::default()
        };
        let mut session = GameSession::new(settings, fastrand::Rng::with_seed(3));
        session.enemies_mut().clear_all();
        let at = session.player().position();
        session
            .enemies_mut()
            .add_enemy(CloudEnemy::new(EnemyKind::Bug, at));
        session.update(&InputSnapshot::new(), DT);
        assert_eq!(session.mode(), GameMode::Combat);

        let mut pilot = Autopilot::new(fastrand::Rng::with_seed(3));
        for _ in 0..5_000 {
            let input = pilot.next_input(&session, 0.1);
            session.update(&input, 0.1);
            if session.mode() != GameMode::Combat {
                break;
            }
        }
        assert_eq!(session.mode(), GameMode::Exploring);
        assert!(!session.combat().is_active());
    }

    #[test]
    fn test_no_destination_while_lessons_remain() {
        let session = GameSession::new(calm_settings(), fastrand::Rng::with_seed(4));
        let pilot = Autopilot::new(fastrand::Rng::with_seed(4));
        assert_eq!(pilot.destination(&session), None);
        assert!(!Autopilot::is_finished(&session));
    }

    #[test]
    fn test_movement_input_directions() {
        let input = movement_input(Vec2::new(-50.0, 0.0));
        assert!(input.is_held(Action::MoveLeft));
        assert!(!input.is_held(Action::MoveDown));
        assert!(!input.is_held(Action::MoveUp));

        let input = movement_input(Vec2::new(0.0, 1.0));
        assert!(input.is_held(Action::MoveDown));
        assert!(!input.is_held(Action::MoveRight));
    }
}
