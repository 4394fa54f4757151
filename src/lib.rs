pub mod ai;
pub mod game;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{decide_move, select_move, MoveDecision};
pub use game::{
    Board, CellIndex, GameEvent, GameState, IntegrityError, Mark, Outcome, PlaceMarkAction,
    RuleEngine, RuleError, RuleResolution, ScoreTally, BOARD_CELLS, CENTER_CELL, WIN_LINES,
};

/// 人类执 X 先手，电脑执 O。
pub const HUMAN_MARK: Mark = Mark::X;
pub const COMPUTER_MARK: Mark = Mark::O;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_mark(value: &str) -> Result<Mark, JsValue> {
    Mark::from_str(value).map_err(|_| JsValue::from_str("mark must be \"X\" or \"O\""))
}

#[derive(Serialize)]
struct ComputerMoveResponse {
    decision: MoveDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<RuleResolution>,
}

#[wasm_bindgen]
pub struct GameEngine {
    state: GameState,
    scores: ScoreTally,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(initial_state_json: Option<String>) -> Result<GameEngine, JsValue> {
        let state = if let Some(json) = initial_state_json {
            serde_json::from_str(&json).map_err(serde_to_js_error)?
        } else {
            GameState::new(HUMAN_MARK)
        };
        Ok(GameEngine {
            state,
            scores: ScoreTally::default(),
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: GameState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.state = state;
        Ok(())
    }

    /// 计分板：跨局累计，刷新页面才会归零。
    pub fn scores_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.scores).map_err(serde_to_js_error)
    }

    pub fn play_human_move(&mut self, index: usize) -> Result<String, JsValue> {
        let mut engine = RuleEngine::new();
        let events = engine
            .place_mark(
                &mut self.state,
                PlaceMarkAction {
                    mark: HUMAN_MARK,
                    index,
                },
            )
            .map_err(to_js_error)?;
        let resolution = RuleResolution::new(self.state.clone(), events);
        self.record_outcome(&resolution);
        serde_json::to_string(&resolution).map_err(serde_to_js_error)
    }

    /// 为电脑选点并立即落子。
    pub fn computer_move(&mut self) -> Result<String, JsValue> {
        let decision = decide_move(&self.state.board, COMPUTER_MARK).map_err(to_js_error)?;
        let mut engine = RuleEngine::new();
        let events = engine
            .place_mark(
                &mut self.state,
                PlaceMarkAction {
                    mark: COMPUTER_MARK,
                    index: decision.index,
                },
            )
            .map_err(to_js_error)?;
        let resolution = RuleResolution::new(self.state.clone(), events);
        self.record_outcome(&resolution);

        let response = ComputerMoveResponse {
            decision,
            applied: Some(resolution),
        };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }

    /// 模拟"思考"延迟后给出决策；只选点，不落子，由前端再调用
    /// `computer_move` 应用（两段式回合协议）。
    pub fn think_computer_move(&self, delay_ms: Option<u32>) -> Promise {
        let board = self.state.board;
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let decision = decide_move(&board, COMPUTER_MARK).map_err(to_js_error)?;
            let json = serde_json::to_string(&decision).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }

    /// 重开一局，保留计分板。
    pub fn restart(&mut self) -> Result<String, JsValue> {
        let mut engine = RuleEngine::new();
        let events = engine
            .restart(&mut self.state, HUMAN_MARK)
            .map_err(to_js_error)?;
        let resolution = RuleResolution::new(self.state.clone(), events);
        serde_json::to_string(&resolution).map_err(serde_to_js_error)
    }

    fn record_outcome(&mut self, resolution: &RuleResolution) {
        if let Some(outcome) = &resolution.outcome {
            self.scores.record(outcome, HUMAN_MARK);
            web_sys::console::log_1(&format!("game over: {outcome:?}").into());
        }
    }
}

/// 返回一个初始游戏状态，方便前端调试或初始化。
#[wasm_bindgen(js_name = "createGameState")]
pub fn create_game_state() -> Result<JsValue, JsValue> {
    to_value(&GameState::new(HUMAN_MARK)).map_err(JsValue::from)
}

/// 判定当前棋盘的结果（继续 / 胜负 / 平局）。
#[wasm_bindgen(js_name = "evaluateBoard")]
pub fn evaluate_board(board: JsValue) -> Result<JsValue, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    to_value(&board.outcome()).map_err(JsValue::from)
}

/// 查询整体状态的对局结果（规则引擎的状态查询入口）。
#[wasm_bindgen(js_name = "checkOutcome")]
pub fn check_outcome_js(state: JsValue) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    to_value(&RuleEngine::check_outcome(&state)).map_err(JsValue::from)
}

/// 为指定一方选点，不修改传入的棋盘。
#[wasm_bindgen(js_name = "selectMove")]
pub fn select_move_js(board: JsValue, mover: &str) -> Result<usize, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    let mover = parse_mark(mover)?;
    select_move(&board, mover).map_err(to_js_error)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    state
        .integrity_check()
        .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))?;
    Ok(())
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
