use crate::uci::moves::parse_uci_move;
use crate::{AnalysisEvent, Score};

/// Parse one `info` progress line.
///
/// Returns `None` unless both a depth and a score are present. Missing
/// `nodes`/`time` default to zero. The principal variation runs from the
/// token after `pv` up to the first token that is not a move.
pub fn parse_info_line(line: &str) -> Option<AnalysisEvent> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let tokens = match tokens.split_first() {
        Some((&"info", rest)) => rest,
        _ => &tokens[..],
    };

    let mut depth = None;
    let mut score = None;
    let mut pv = Vec::new();
    let mut nodes = None;
    let mut time_ms = None;
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nodes" => {
                i += 1;
                nodes = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "time" => {
                i += 1;
                time_ms = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "score" => {
                i += 1;
                if let Some(&kind) = tokens.get(i) {
                    i += 1;
                    if let Some(value) = tokens.get(i) {
                        score = match kind {
                            "cp" => value.parse().ok().map(Score::Centipawns),
                            "mate" => value.parse().ok().map(Score::Mate),
                            _ => None,
                        };
                    }
                }
            }
            "pv" => {
                i += 1;
                while let Some(mv) = tokens.get(i).and_then(|s| parse_uci_move(s).ok()) {
                    pv.push(mv);
                    i += 1;
                }
                continue; // resume at the token that ended the run
            }
            // Free text runs to end of line.
            "string" => break,
            _ => {}
        }
        i += 1;
    }

    Some(AnalysisEvent {
        depth: depth?,
        score: score?,
        pv,
        nodes: nodes.unwrap_or(0),
        time_ms: time_ms.unwrap_or(0),
    })
}

/// First whitespace-delimited token of a line, if any.
pub(crate) fn first_token(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_info_line() {
        let event = parse_info_line("info depth 12 score cp 34 pv e2e4 e7e5 nodes 1000 time 50")
            .unwrap();
        assert_eq!(event.depth, 12);
        assert_eq!(event.score, Score::Centipawns(34));
        assert_eq!(
            event.pv.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
            vec!["e2e4", "e7e5"]
        );
        assert_eq!(event.nodes, 1000);
        assert_eq!(event.time_ms, 50);
    }

    #[test]
    fn test_info_string_is_not_parseable() {
        assert!(parse_info_line("info string hello").is_none());
        assert!(parse_info_line("info string depth 3 score cp 1").is_none());
    }

    #[test]
    fn test_depth_and_score_required() {
        assert!(parse_info_line("info depth 5 nodes 10").is_none());
        assert!(parse_info_line("info score cp 10 nodes 10").is_none());
        assert!(parse_info_line("info currmove e2e4 currmovenumber 1").is_none());
    }

    #[test]
    fn test_missing_nodes_and_time_default_to_zero() {
        let event = parse_info_line("info depth 1 score cp -20").unwrap();
        assert_eq!(event.score.centipawns(), Some(-20));
        assert_eq!(event.nodes, 0);
        assert_eq!(event.time_ms, 0);
        assert!(event.pv.is_empty());
    }

    #[test]
    fn test_mate_score() {
        let event = parse_info_line("info depth 20 seldepth 4 score mate -3 pv h7h8q").unwrap();
        assert_eq!(event.score, Score::Mate(-3));
        assert_eq!(event.score.centipawns(), None);
        assert_eq!(event.pv.len(), 1);
    }

    #[test]
    fn test_malformed_trailing_pv_token_truncates() {
        let event = parse_info_line("info depth 8 score cp 5 pv e2e4 e7e5 zz99 g1f3").unwrap();
        assert_eq!(event.pv.len(), 2);
    }

    #[test]
    fn test_fields_after_pv_still_read() {
        let event =
            parse_info_line("info depth 3 seldepth 5 multipv 1 score cp 12 nodes 77 nps 1000 pv d2d4 time 9")
                .unwrap();
        assert_eq!(event.depth, 3);
        assert_eq!(event.nodes, 77);
        assert_eq!(event.pv.len(), 1);
        assert_eq!(event.time_ms, 9);
    }
}
