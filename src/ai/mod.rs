//! AI 决策模块（启发式捷径 + 带剪枝的极小极大搜索）。

pub mod minimax;

pub use minimax::{decide_move, select_move, MoveDecision};
