pub mod error;
pub mod game_data;
pub mod pgn;
pub mod position;

pub use error::ParseError;
pub use game_data::{GameInfo, MoveIndex, NotationDocument, PgnComment, START_INDEX};
pub use pgn::{parse_pgn, parse_pgn_from};
pub use position::STANDARD_START_FEN;
