//! 游戏核心逻辑模块（棋盘状态、规则引擎）。

pub mod rules;
pub mod state;

pub use rules::{PlaceMarkAction, RuleEngine, RuleError, RuleResolution};
pub use state::{
    Board,
    CellIndex,
    GameEvent,
    GameState,
    IntegrityError,
    Mark,
    Outcome,
    ScoreTally,
    BOARD_CELLS,
    CENTER_CELL,
    WIN_LINES,
};
