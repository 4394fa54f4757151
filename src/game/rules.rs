use serde::{Deserialize, Serialize};

use super::state::{
    CellIndex, GameEvent, GameState, IntegrityError, Mark, Outcome, BOARD_CELLS,
};

/// 落子动作。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaceMarkAction {
    pub mark: Mark,
    pub index: CellIndex,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    GameFinished,
    NotPlayerTurn,
    CellOutOfRange { index: CellIndex },
    CellOccupied { index: CellIndex },
    BoardFull,
    IntegrityViolation { error: IntegrityError },
}

/// 一次规则操作之后返回给前端的快照。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

impl RuleResolution {
    pub fn new(state: GameState, events: Vec<GameEvent>) -> Self {
        let outcome = if state.game_over {
            Some(state.board.outcome())
        } else {
            None
        };
        Self {
            state,
            events,
            outcome,
        }
    }
}

#[derive(Debug, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    fn ensure_turn_owner(state: &GameState, mark: Mark) -> Result<(), RuleError> {
        if state.current_player != mark {
            return Err(RuleError::NotPlayerTurn);
        }
        Ok(())
    }

    fn ensure_integrity(state: &GameState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    /// 落子：校验、写入、判定结果、换手。
    pub fn place_mark(
        &mut self,
        state: &mut GameState,
        action: PlaceMarkAction,
    ) -> Result<Vec<GameEvent>, RuleError> {
        if state.is_finished() {
            return Err(RuleError::GameFinished);
        }

        Self::ensure_integrity(state)?;
        Self::ensure_turn_owner(state, action.mark)?;

        if action.index >= BOARD_CELLS {
            return Err(RuleError::CellOutOfRange {
                index: action.index,
            });
        }
        if !state.board.place(action.index, action.mark) {
            return Err(RuleError::CellOccupied {
                index: action.index,
            });
        }

        let mut events = vec![GameEvent::MarkPlaced {
            mark: action.mark,
            index: action.index,
        }];

        match state.board.outcome() {
            Outcome::Win { mark, line } => {
                state.game_over = true;
                state.winning_line = Some(line);
                events.push(GameEvent::GameWon { mark, line });
            }
            Outcome::Draw => {
                state.game_over = true;
                events.push(GameEvent::GameDrawn);
            }
            Outcome::InProgress => {
                state.current_player = state.current_player.other();
            }
        }

        Ok(events)
    }

    /// 重开一局，计分板由调用方保留。
    pub fn restart(
        &mut self,
        state: &mut GameState,
        first_player: Mark,
    ) -> Result<Vec<GameEvent>, RuleError> {
        state.restart(first_player);
        Ok(vec![GameEvent::GameRestarted])
    }

    pub fn check_outcome(state: &GameState) -> Outcome {
        state.board.outcome()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(engine: &mut RuleEngine, state: &mut GameState, mark: Mark, index: CellIndex) {
        engine
            .place_mark(state, PlaceMarkAction { mark, index })
            .expect("move should be legal");
    }

    #[test]
    fn place_mark_records_event_and_passes_the_turn() {
        let mut engine = RuleEngine::new();
        let mut state = GameState::new(Mark::X);

        let events = engine
            .place_mark(
                &mut state,
                PlaceMarkAction {
                    mark: Mark::X,
                    index: 0,
                },
            )
            .expect("move should be legal");

        assert_eq!(
            events,
            vec![GameEvent::MarkPlaced {
                mark: Mark::X,
                index: 0
            }]
        );
        assert_eq!(state.board.get(0), Some(Mark::X));
        assert_eq!(state.current_player, Mark::O);
        assert!(!state.game_over);
    }

    #[test]
    fn occupied_cell_is_rejected() {
        let mut engine = RuleEngine::new();
        let mut state = GameState::new(Mark::X);
        play(&mut engine, &mut state, Mark::X, 0);

        let result = engine.place_mark(
            &mut state,
            PlaceMarkAction {
                mark: Mark::O,
                index: 0,
            },
        );
        assert_eq!(result, Err(RuleError::CellOccupied { index: 0 }));
    }

    #[test]
    fn out_of_range_cell_is_rejected() {
        let mut engine = RuleEngine::new();
        let mut state = GameState::new(Mark::X);

        let result = engine.place_mark(
            &mut state,
            PlaceMarkAction {
                mark: Mark::X,
                index: 9,
            },
        );
        assert_eq!(result, Err(RuleError::CellOutOfRange { index: 9 }));
    }

    #[test]
    fn moving_out_of_turn_is_rejected() {
        let mut engine = RuleEngine::new();
        let mut state = GameState::new(Mark::X);

        let result = engine.place_mark(
            &mut state,
            PlaceMarkAction {
                mark: Mark::O,
                index: 0,
            },
        );
        assert_eq!(result, Err(RuleError::NotPlayerTurn));
    }

    #[test]
    fn winning_move_ends_the_game_with_line() {
        let mut engine = RuleEngine::new();
        let mut state = GameState::new(Mark::X);
        play(&mut engine, &mut state, Mark::X, 0);
        play(&mut engine, &mut state, Mark::O, 3);
        play(&mut engine, &mut state, Mark::X, 1);
        play(&mut engine, &mut state, Mark::O, 4);

        let events = engine
            .place_mark(
                &mut state,
                PlaceMarkAction {
                    mark: Mark::X,
                    index: 2,
                },
            )
            .expect("winning move should be legal");

        assert!(state.game_over);
        assert_eq!(state.winning_line, Some([0, 1, 2]));
        assert!(events.contains(&GameEvent::GameWon {
            mark: Mark::X,
            line: [0, 1, 2]
        }));
    }

    #[test]
    fn no_moves_are_accepted_after_the_game_ends() {
        let mut engine = RuleEngine::new();
        let mut state = GameState::new(Mark::X);
        play(&mut engine, &mut state, Mark::X, 0);
        play(&mut engine, &mut state, Mark::O, 3);
        play(&mut engine, &mut state, Mark::X, 1);
        play(&mut engine, &mut state, Mark::O, 4);
        play(&mut engine, &mut state, Mark::X, 2);

        let result = engine.place_mark(
            &mut state,
            PlaceMarkAction {
                mark: Mark::O,
                index: 5,
            },
        );
        assert_eq!(result, Err(RuleError::GameFinished));
    }

    #[test]
    fn drawn_game_emits_draw_event() {
        let mut engine = RuleEngine::new();
        let mut state = GameState::new(Mark::X);
        // X O X / X O O / O X X, X to finish at 8.
        for (mark, index) in [
            (Mark::X, 0),
            (Mark::O, 1),
            (Mark::X, 2),
            (Mark::O, 4),
            (Mark::X, 3),
            (Mark::O, 5),
            (Mark::X, 7),
            (Mark::O, 6),
        ] {
            play(&mut engine, &mut state, mark, index);
        }

        let events = engine
            .place_mark(
                &mut state,
                PlaceMarkAction {
                    mark: Mark::X,
                    index: 8,
                },
            )
            .expect("final move should be legal");

        assert!(state.game_over);
        assert_eq!(state.winning_line, None);
        assert!(events.contains(&GameEvent::GameDrawn));
    }

    #[test]
    fn check_outcome_tracks_the_board_status() {
        let mut engine = RuleEngine::new();
        let mut state = GameState::new(Mark::X);
        assert_eq!(RuleEngine::check_outcome(&state), Outcome::InProgress);

        play(&mut engine, &mut state, Mark::X, 0);
        play(&mut engine, &mut state, Mark::O, 3);
        play(&mut engine, &mut state, Mark::X, 1);
        play(&mut engine, &mut state, Mark::O, 4);
        play(&mut engine, &mut state, Mark::X, 2);

        assert_eq!(
            RuleEngine::check_outcome(&state),
            Outcome::Win {
                mark: Mark::X,
                line: [0, 1, 2]
            }
        );
    }

    #[test]
    fn restart_clears_the_state_and_emits_event() {
        let mut engine = RuleEngine::new();
        let mut state = GameState::new(Mark::X);
        play(&mut engine, &mut state, Mark::X, 4);

        let events = engine
            .restart(&mut state, Mark::X)
            .expect("restart should succeed");

        assert_eq!(events, vec![GameEvent::GameRestarted]);
        assert_eq!(state, GameState::new(Mark::X));
    }

    #[test]
    fn resolution_carries_final_outcome() {
        let mut engine = RuleEngine::new();
        let mut state = GameState::new(Mark::X);
        play(&mut engine, &mut state, Mark::X, 0);
        play(&mut engine, &mut state, Mark::O, 3);
        play(&mut engine, &mut state, Mark::X, 1);
        play(&mut engine, &mut state, Mark::O, 4);
        let events = engine
            .place_mark(
                &mut state,
                PlaceMarkAction {
                    mark: Mark::X,
                    index: 2,
                },
            )
            .expect("winning move should be legal");

        let resolution = RuleResolution::new(state, events);
        assert_eq!(
            resolution.outcome,
            Some(Outcome::Win {
                mark: Mark::X,
                line: [0, 1, 2]
            })
        );
    }
}
