//! PGN parsing on top of `pgn-reader`: tags are collected, and every mainline
//! move is replayed with shakmaty to build the position sequence.
//!
//! Parsing is all-or-nothing: the first move that cannot be played aborts
//! with a [`ParseError`], so callers never see a truncated game. Variations
//! are walked but not replayed.

use std::collections::BTreeMap;
use std::ops::ControlFlow;

use pgn_reader::{RawComment, RawTag, Reader, SanPlus, Skip, Visitor};
use shakmaty::san::San;
use shakmaty::{Chess, Position};

use crate::error::ParseError;
use crate::game_data::{MoveIndex, NotationDocument, PgnComment};
use crate::position::{position_string, setup_position};

/// Parse a PGN game, starting from the standard position unless the
/// headers carry `[FEN "..."]`.
pub fn parse_pgn(pgn: &str) -> Result<NotationDocument, ParseError> {
    parse_pgn_from(pgn, None)
}

/// Parse a PGN game whose moves continue from `initial_fen`.
/// An explicit initial position takes precedence over a `FEN` header.
pub fn parse_pgn_from(pgn: &str, initial_fen: Option<&str>) -> Result<NotationDocument, ParseError> {
    let mut builder = DocumentBuilder { initial_fen };
    let mut reader = Reader::new(pgn.as_bytes());

    let parsed = reader
        .read_game(&mut builder)
        .map_err(|e| ParseError::Read(e.to_string()))?;

    let mut document = match parsed {
        Some(result) => result?,
        // Nothing but whitespace: a game with no moves.
        None => Replay::start(BTreeMap::new(), initial_fen)?.finish(),
    };
    document.raw_text = pgn.to_string();
    Ok(document)
}

/// Mainline replay state for one game.
struct Replay {
    headers: BTreeMap<String, String>,
    pos: Chess,
    positions: Vec<String>,
    moves: Vec<String>,
    comments: Vec<PgnComment>,
    variation_depth: usize,
}

impl Replay {
    fn start(headers: BTreeMap<String, String>, initial_fen: Option<&str>) -> Result<Self, ParseError> {
        let start_fen = initial_fen.or_else(|| headers.get("FEN").map(String::as_str));
        let pos = match start_fen {
            Some(fen) => setup_position(fen)?,
            None => Chess::default(),
        };

        Ok(Self {
            positions: vec![position_string(&pos)],
            headers,
            pos,
            moves: Vec::new(),
            comments: Vec::new(),
            variation_depth: 0,
        })
    }

    fn last_index(&self) -> MoveIndex {
        self.moves.len() as MoveIndex - 1
    }

    fn play(&mut self, san_plus: SanPlus) -> Result<(), ParseError> {
        let ply = self.moves.len() + 1;
        let token = san_plus.to_string();

        // Null moves and piece drops are not moves of a standard game.
        if matches!(san_plus.san, San::Null | San::Put { .. }) {
            tracing::warn!(ply, token = %token, "Unplayable movetext token, aborting parse");
            return Err(ParseError::InvalidToken { ply, token });
        }

        let mv = san_plus.san.to_move(&self.pos).map_err(|_| {
            tracing::warn!(ply, token = %token, "Illegal move in PGN, aborting parse");
            ParseError::IllegalMove { ply, token: token.clone() }
        })?;

        self.pos.play_unchecked(mv);
        self.positions.push(position_string(&self.pos));
        self.moves.push(token);
        Ok(())
    }

    fn finish(self) -> NotationDocument {
        NotationDocument {
            raw_text: String::new(),
            headers: self.headers,
            positions: self.positions,
            moves: self.moves,
            comments: self.comments,
        }
    }
}

struct DocumentBuilder<'a> {
    initial_fen: Option<&'a str>,
}

impl Visitor for DocumentBuilder<'_> {
    type Tags = BTreeMap<String, String>;
    type Movetext = Replay;
    type Output = Result<NotationDocument, ParseError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(BTreeMap::new())
    }

    fn tag(&mut self, tags: &mut Self::Tags, name: &[u8], value: RawTag<'_>) -> ControlFlow<Self::Output> {
        // Later duplicates overwrite earlier ones.
        tags.insert(
            String::from_utf8_lossy(name).into_owned(),
            value.decode_utf8_lossy().into_owned(),
        );
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        match Replay::start(tags, self.initial_fen) {
            Ok(replay) => ControlFlow::Continue(replay),
            Err(e) => {
                tracing::warn!("Invalid initial position, aborting parse: {e}");
                ControlFlow::Break(Err(e))
            }
        }
    }

    fn san(&mut self, game: &mut Replay, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        if game.variation_depth > 0 {
            return ControlFlow::Continue(());
        }
        match game.play(san_plus) {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => ControlFlow::Break(Err(e)),
        }
    }

    fn comment(&mut self, game: &mut Replay, comment: RawComment<'_>) -> ControlFlow<Self::Output> {
        if game.variation_depth == 0 {
            let text = String::from_utf8_lossy(comment.as_bytes());
            game.comments.push(PgnComment {
                move_index: game.last_index(),
                text: text.split_whitespace().collect::<Vec<_>>().join(" "),
            });
        }
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, game: &mut Replay) -> ControlFlow<Self::Output, Skip> {
        game.variation_depth += 1;
        ControlFlow::Continue(Skip(false))
    }

    fn end_variation(&mut self, game: &mut Replay) -> ControlFlow<Self::Output> {
        game.variation_depth = game.variation_depth.saturating_sub(1);
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, game: Replay) -> Self::Output {
        if game.variation_depth > 0 {
            tracing::warn!(depth = game.variation_depth, "Variation left open at end of game");
            return Err(ParseError::UnterminatedVariation);
        }
        Ok(game.finish())
    }
}
