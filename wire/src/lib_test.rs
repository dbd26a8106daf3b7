use super::*;

fn pos(row: u8, col: u8) -> Position {
    Position::new(row, col).expect("position in range")
}

#[test]
fn mark_other_flips_both_ways() {
    assert_eq!(Mark::X.other(), Mark::O);
    assert_eq!(Mark::O.other(), Mark::X);
}

#[test]
fn mark_serializes_as_bare_letter() {
    assert_eq!(serde_json::to_string(&Mark::X).expect("serialize"), "\"X\"");
    assert_eq!(serde_json::to_string(&Mark::O).expect("serialize"), "\"O\"");
}

#[test]
fn status_serializes_as_lowercase_json() {
    assert_eq!(
        serde_json::to_string(&GameStatus::Waiting).expect("serialize"),
        "\"waiting\""
    );
    assert_eq!(
        serde_json::to_string(&GameStatus::Ongoing).expect("serialize"),
        "\"ongoing\""
    );
    assert_eq!(
        serde_json::to_string(&GameStatus::Finished).expect("serialize"),
        "\"finished\""
    );
}

#[test]
fn status_rejects_non_lowercase_json() {
    assert!(serde_json::from_str::<GameStatus>("\"Ongoing\"").is_err());
}

#[test]
fn outcome_serializes_winner_as_mark_and_draw_as_word() {
    assert_eq!(
        serde_json::to_string(&GameOutcome::Winner(Mark::O)).expect("serialize"),
        "\"O\""
    );
    assert_eq!(
        serde_json::to_string(&GameOutcome::Draw).expect("serialize"),
        "\"draw\""
    );
}

#[test]
fn outcome_deserializes_all_three_forms() {
    assert_eq!(
        serde_json::from_str::<GameOutcome>("\"X\"").expect("deserialize"),
        GameOutcome::Winner(Mark::X)
    );
    assert_eq!(
        serde_json::from_str::<GameOutcome>("\"draw\"").expect("deserialize"),
        GameOutcome::Draw
    );
    assert!(serde_json::from_str::<GameOutcome>("\"tie\"").is_err());
}

#[test]
fn position_round_trips_through_text() {
    let position = pos(2, 1);
    assert_eq!(position.to_string(), "2,1");
    assert_eq!("2,1".parse::<Position>().expect("parse"), position);
}

#[test]
fn position_parse_tolerates_spaces() {
    assert_eq!(" 0 , 2 ".parse::<Position>().expect("parse"), pos(0, 2));
}

#[test]
fn position_rejects_out_of_range_coordinates() {
    let err = Position::new(3, 0).expect_err("row out of range");
    assert_eq!(err, PositionError::OutOfRange(3, 0));
    let err = "0,3".parse::<Position>().expect_err("col out of range");
    assert_eq!(err, PositionError::OutOfRange(0, 3));
}

#[test]
fn position_rejects_malformed_text() {
    for raw in ["", "1", "a,b", "1,2,3", "-1,0"] {
        assert!(
            matches!(
                raw.parse::<Position>(),
                Err(PositionError::Malformed(_)) | Err(PositionError::OutOfRange(..))
            ),
            "`{raw}` should fail to parse"
        );
    }
}

#[test]
fn position_serde_uses_the_text_form() {
    let json = serde_json::to_string(&pos(1, 2)).expect("serialize");
    assert_eq!(json, "\"1,2\"");
    assert_eq!(
        serde_json::from_str::<Position>("\"1,2\"").expect("deserialize"),
        pos(1, 2)
    );
}

#[test]
fn board_serializes_as_nested_arrays() {
    let board = Board::empty()
        .with_mark(pos(0, 0), Mark::X)
        .with_mark(pos(1, 1), Mark::O);
    let json = serde_json::to_value(board).expect("serialize");
    assert_eq!(
        json,
        serde_json::json!([["X", null, null], [null, "O", null], [null, null, null]])
    );
}

#[test]
fn board_counts_marks_independently() {
    let board = Board::empty()
        .with_mark(pos(0, 0), Mark::X)
        .with_mark(pos(0, 1), Mark::O)
        .with_mark(pos(2, 2), Mark::X);
    assert_eq!(board.count(Mark::X), 2);
    assert_eq!(board.count(Mark::O), 1);
    assert_eq!(board.cell(pos(0, 1)), Some(Mark::O));
    assert_eq!(board.cell(pos(1, 0)), None);
}

#[test]
fn command_encoding_carries_the_snake_case_tag() {
    let create = ClientCommand::CreateRoom {
        room_id: "room-1".to_owned(),
    };
    let json: serde_json::Value =
        serde_json::from_str(&encode_command(&create)).expect("valid json");
    assert_eq!(json["type"], "create_room");
    assert_eq!(json["room_id"], "room-1");

    let join = ClientCommand::JoinRoom {
        room_id: "room-1".to_owned(),
    };
    let json: serde_json::Value = serde_json::from_str(&encode_command(&join)).expect("valid json");
    assert_eq!(json["type"], "join_room");
}

#[test]
fn decode_event_round_trips_every_variant() {
    let events = [
        ServerEvent::RoomCreated {
            room_id: "room-1".to_owned(),
            players: 1,
        },
        ServerEvent::RoomJoined {
            room_id: "room-1".to_owned(),
            players: 2,
        },
        ServerEvent::PlayerJoined {
            room_id: "room-1".to_owned(),
            players: 2,
        },
        ServerEvent::GameStarted {
            game_id: "room-1".to_owned(),
            status: GameStatus::Ongoing,
        },
        ServerEvent::MoveMade {
            game_id: "room-1".to_owned(),
            player_id: "player-a".to_owned(),
            position: pos(0, 0),
            symbol: Mark::X,
            board: Board::empty().with_mark(pos(0, 0), Mark::X),
            winner: None,
            game_status: GameStatus::Ongoing,
        },
    ];

    for event in events {
        let text = serde_json::to_string(&event).expect("serialize");
        let decoded = decode_event(&text).expect("decode");
        assert_eq!(decoded, event);
    }
}

#[test]
fn decode_event_accepts_move_made_without_winner_field() {
    let text = serde_json::json!({
        "type": "move_made",
        "game_id": "room-1",
        "player_id": "player-a",
        "position": "1,1",
        "symbol": "O",
        "board": [[null, null, null], [null, "O", null], [null, null, null]],
        "game_status": "ongoing"
    })
    .to_string();

    let decoded = decode_event(&text).expect("decode");
    let ServerEvent::MoveMade { winner, symbol, .. } = decoded else {
        panic!("expected move_made");
    };
    assert_eq!(winner, None);
    assert_eq!(symbol, Mark::O);
}

#[test]
fn decode_event_rejects_unknown_tag_and_malformed_json() {
    assert!(matches!(
        decode_event("{\"type\":\"room_exploded\"}"),
        Err(CodecError::Decode(_))
    ));
    assert!(matches!(decode_event("not json"), Err(CodecError::Decode(_))));
}

#[test]
fn event_kind_matches_variant() {
    let event = ServerEvent::GameStarted {
        game_id: "g".to_owned(),
        status: GameStatus::Ongoing,
    };
    assert_eq!(event.kind(), EventKind::GameStarted);
}

#[test]
fn players_present_only_on_occupancy_events() {
    let created = ServerEvent::RoomCreated {
        room_id: "r".to_owned(),
        players: 1,
    };
    assert_eq!(created.players(), Some(1));

    let started = ServerEvent::GameStarted {
        game_id: "g".to_owned(),
        status: GameStatus::Ongoing,
    };
    assert_eq!(started.players(), None);
}
