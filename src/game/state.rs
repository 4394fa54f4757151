use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 棋盘格子索引（0..=8，按行优先排列）。
pub type CellIndex = usize;

pub const BOARD_CELLS: usize = 9;
pub const CENTER_CELL: CellIndex = 4;

/// 八条获胜连线：三行、三列、两条对角线。
/// 判定时按此固定顺序扫描，命中第一条即返回。
pub const WIN_LINES: [[CellIndex; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 棋子符号。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn other(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

impl FromStr for Mark {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "X" => Ok(Mark::X),
            "O" => Ok(Mark::O),
            _ => Err(()),
        }
    }
}

/// 棋盘状态：9 个格子，`None` 表示空位。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Board {
    cells: [Option<Mark>; BOARD_CELLS],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: CellIndex) -> Option<Mark> {
        self.cells.get(index).copied().flatten()
    }

    /// Places a mark into an empty cell. Occupied cells are never
    /// overwritten; returns whether the mark was placed.
    pub fn place(&mut self, index: CellIndex, mark: Mark) -> bool {
        match self.cells.get_mut(index) {
            Some(cell) if cell.is_none() => {
                *cell = Some(mark);
                true
            }
            _ => false,
        }
    }

    /// Removes a mark again. Used by the search to undo hypothetical
    /// placements; callers must restore every cell they touched.
    pub fn clear(&mut self, index: CellIndex) {
        if let Some(cell) = self.cells.get_mut(index) {
            *cell = None;
        }
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_some())
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| index)
    }

    pub fn mark_count(&self, mark: Mark) -> usize {
        self.cells.iter().filter(|cell| **cell == Some(mark)).count()
    }

    /// 结果判定：先扫连线，再看是否下满。
    pub fn outcome(&self) -> Outcome {
        for line in WIN_LINES {
            let [a, b, c] = line;
            if let Some(mark) = self.cells[a] {
                if self.cells[b] == Some(mark) && self.cells[c] == Some(mark) {
                    return Outcome::Win { mark, line };
                }
            }
        }

        if self.is_full() {
            Outcome::Draw
        } else {
            Outcome::InProgress
        }
    }
}

/// 对局结果。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Outcome {
    InProgress,
    Win { mark: Mark, line: [CellIndex; 3] },
    Draw,
}

impl Outcome {
    pub fn is_finished(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    MarkPlaced {
        mark: Mark,
        index: CellIndex,
    },
    GameWon {
        mark: Mark,
        line: [CellIndex; 3],
    },
    GameDrawn,
    GameRestarted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    MarkCountSkew { x_count: usize, o_count: usize },
    OutcomeNotFlagged,
    StaleGameOver,
    WinningLineMismatch { expected: [CellIndex; 3] },
}

/// 游戏整体状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    #[serde(default)]
    pub board: Board,
    pub current_player: Mark,
    #[serde(default)]
    pub game_over: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_line: Option<[CellIndex; 3]>,
}

impl GameState {
    pub fn new(first_player: Mark) -> Self {
        Self {
            board: Board::new(),
            current_player: first_player,
            game_over: false,
            winning_line: None,
        }
    }

    /// 重开一局：清空棋盘，回到先手。
    pub fn restart(&mut self, first_player: Mark) {
        self.board = Board::new();
        self.current_player = first_player;
        self.game_over = false;
        self.winning_line = None;
    }

    pub fn is_finished(&self) -> bool {
        self.game_over
    }

    /// Validates that an externally supplied state is one a legally
    /// played game could produce and that the bookkeeping flags agree
    /// with the board.
    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let x_count = self.board.mark_count(Mark::X);
        let o_count = self.board.mark_count(Mark::O);
        if x_count.abs_diff(o_count) > 1 {
            return Err(IntegrityError::MarkCountSkew { x_count, o_count });
        }

        match self.board.outcome() {
            Outcome::Win { line, .. } => {
                if !self.game_over {
                    return Err(IntegrityError::OutcomeNotFlagged);
                }
                if self.winning_line != Some(line) {
                    return Err(IntegrityError::WinningLineMismatch { expected: line });
                }
            }
            Outcome::Draw => {
                if !self.game_over {
                    return Err(IntegrityError::OutcomeNotFlagged);
                }
            }
            Outcome::InProgress => {
                if self.game_over {
                    return Err(IntegrityError::StaleGameOver);
                }
            }
        }

        Ok(())
    }
}

/// 计分板：跨局累计，仅在引擎启动时归零。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreTally {
    pub player: u32,
    pub draw: u32,
    pub ai: u32,
}

impl ScoreTally {
    pub fn record(&mut self, outcome: &Outcome, human: Mark) {
        match outcome {
            Outcome::Win { mark, .. } if *mark == human => self.player += 1,
            Outcome::Win { .. } => self.ai += 1,
            Outcome::Draw => self.draw += 1,
            Outcome::InProgress => {}
        }
    }
}
