use serde::{Deserialize, Serialize};

use crate::game::{Board, CellIndex, Mark, Outcome, RuleError, BOARD_CELLS, CENTER_CELL};

/// 终局基准分：越快获胜分越高，越晚落败分越高。
const WIN_SCORE: i32 = 10;

/// 一次选点的结果，附带搜索统计，便于前端展示。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveDecision {
    pub index: CellIndex,
    pub score: i32,
    pub nodes: u64,
}

struct SearchStats {
    nodes: u64,
}

impl SearchStats {
    fn new() -> Self {
        Self { nodes: 0 }
    }
}

/// Picks the cell the given side should play. The caller keeps ownership
/// of the board; the search works on a scratch copy and the input is
/// never observably mutated. A full board is a caller contract violation
/// and fails fast with `RuleError::BoardFull`.
pub fn select_move(board: &Board, mover: Mark) -> Result<CellIndex, RuleError> {
    decide_move(board, mover).map(|decision| decision.index)
}

/// 决策优先级：占中 → 直接获胜 → 挡对手 → 极小极大搜索。
pub fn decide_move(board: &Board, mover: Mark) -> Result<MoveDecision, RuleError> {
    if board.is_full() {
        return Err(RuleError::BoardFull);
    }

    // Center first whenever it is open. This fires on any move, not
    // just the opening one; the behavior is kept as-is.
    if board.get(CENTER_CELL).is_none() {
        return Ok(MoveDecision {
            index: CENTER_CELL,
            score: 0,
            nodes: 0,
        });
    }

    let mut scratch = *board;
    let opponent = mover.other();

    if let Some(index) = winning_cell(&mut scratch, mover) {
        return Ok(MoveDecision {
            index,
            score: WIN_SCORE,
            nodes: 0,
        });
    }

    if let Some(index) = winning_cell(&mut scratch, opponent) {
        return Ok(MoveDecision {
            index,
            score: 0,
            nodes: 0,
        });
    }

    let mut stats = SearchStats::new();
    let mut best_score = i32::MIN;
    let mut best_index = None;

    for index in 0..BOARD_CELLS {
        if scratch.get(index).is_some() {
            continue;
        }
        scratch.place(index, mover);
        let score = minimax(&mut scratch, mover, 0, false, i32::MIN, i32::MAX, &mut stats);
        scratch.clear(index);

        // Strictly greater keeps the earliest index on ties.
        if score > best_score {
            best_score = score;
            best_index = Some(index);
        }
    }

    let index = best_index.ok_or(RuleError::BoardFull)?;
    Ok(MoveDecision {
        index,
        score: best_score,
        nodes: stats.nodes,
    })
}

/// 找出让 `mark` 一步成线的空位（升序扫描，试放后立刻还原）。
fn winning_cell(board: &mut Board, mark: Mark) -> Option<CellIndex> {
    for index in 0..BOARD_CELLS {
        if board.get(index).is_some() {
            continue;
        }
        board.place(index, mark);
        let wins = matches!(
            board.outcome(),
            Outcome::Win { mark: winner, .. } if winner == mark
        );
        board.clear(index);
        if wins {
            return Some(index);
        }
    }
    None
}

/// Alpha-beta minimax scored from the root mover's perspective. `depth`
/// counts plies from the root of this search, so faster wins and slower
/// losses come out ahead. Every placement is undone before returning.
fn minimax(
    board: &mut Board,
    mover: Mark,
    depth: i32,
    maximizing: bool,
    mut alpha: i32,
    mut beta: i32,
    stats: &mut SearchStats,
) -> i32 {
    stats.nodes += 1;

    match board.outcome() {
        Outcome::Win { mark, .. } => {
            return if mark == mover {
                WIN_SCORE - depth
            } else {
                -WIN_SCORE + depth
            };
        }
        Outcome::Draw => return 0,
        Outcome::InProgress => {}
    }

    if maximizing {
        let mut best = i32::MIN;
        for index in 0..BOARD_CELLS {
            if board.get(index).is_some() {
                continue;
            }
            board.place(index, mover);
            let score = minimax(board, mover, depth + 1, false, alpha, beta, stats);
            board.clear(index);
            best = best.max(score);
            alpha = alpha.max(best);
            if beta <= alpha {
                break;
            }
        }
        best
    } else {
        let mut best = i32::MAX;
        for index in 0..BOARD_CELLS {
            if board.get(index).is_some() {
                continue;
            }
            board.place(index, mover.other());
            let score = minimax(board, mover, depth + 1, true, alpha, beta, stats);
            board.clear(index);
            best = best.min(score);
            beta = beta.min(best);
            if beta <= alpha {
                break;
            }
        }
        best
    }
}
