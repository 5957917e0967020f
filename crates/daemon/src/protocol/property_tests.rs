// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;
use sp_core::Sprite;

use super::{NameParams, Request, Response};

proptest! {
    // Any sprite body survives the wire unchanged.
    #[test]
    fn upsert_round_trips(
        name in "[a-z][a-z0-9-]{0,24}",
        url in "[ -~]{0,40}",
        local_path in "[ -~]{0,40}",
    ) {
        let mut sprite = Sprite::named(name);
        sprite.url = url;
        sprite.local_path = local_path;
        let req = Request::Upsert(sprite);
        let json = serde_json::to_string(&req).unwrap();
        let back: Request = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, req);
    }

    // Error strings survive the wire unchanged, including control-ish text.
    #[test]
    fn error_responses_round_trip(message in "[ -~]{0,80}") {
        let resp = Response::error(&message);
        let json = serde_json::to_string(&resp).unwrap();
        let back: Response = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, Response::Error(message));
    }

    // One frame per line: serialized requests never embed a raw newline.
    #[test]
    fn frames_stay_on_one_line(name in "[a-z]{1,16}") {
        let req = Request::Get(NameParams { name });
        let json = serde_json::to_string(&req).unwrap();
        prop_assert!(!json.contains('\n'));
    }
}
