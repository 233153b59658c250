// Test serialization using json
#![cfg(feature = "serde")]

use glc::{CharMetric, Flags, Rect, RenderStyle, Settings, Transform, Vec2};
use serde::{de::Deserialize, ser::Serialize};
use std::cmp::PartialEq;
use std::fmt::Debug;

fn test<X: Debug + PartialEq + Serialize + for<'a> Deserialize<'a>>(x: X, t: &str) {
    match serde_json::to_string(&x) {
        Ok(text) => assert_eq!(text, t),
        Err(err) => panic!("Ser of '{x:?}' failed: {err}"),
    }

    match serde_json::from_str::<X>(t) {
        Ok(v) => assert_eq!(v, x),
        Err(err) => panic!("Deser of '{t}' failed: {err}"),
    }
}

#[test]
fn vec2() {
    test(Vec2(1.0, 2.0), "[1.0,2.0]");
    test(
        Rect {
            min: Vec2(0.0, -1.0),
            max: Vec2(2.0, 3.0),
        },
        "{\"min\":[0.0,-1.0],\"max\":[2.0,3.0]}",
    );
}

#[test]
fn settings() {
    test(Transform::scale(2.0, 3.0), "[2.0,0.0,0.0,3.0]");
    test(RenderStyle::Triangle, "\"Triangle\"");
    test(Flags::AUTO_FONT | Flags::MIPMAP, "\"AUTO_FONT | MIPMAP\"");

    let settings = Settings::default();
    let text = serde_json::to_string(&settings).unwrap();
    let back: Settings = serde_json::from_str(&text).unwrap();
    assert_eq!(back, settings);
}

#[test]
fn char_metric() {
    let metric = CharMetric {
        baseline: [Vec2(0.0, 0.0), Vec2(0.5, 0.0)],
        bounds: [
            Vec2(0.0, 0.0),
            Vec2(0.5, 0.0),
            Vec2(0.5, 1.0),
            Vec2(0.0, 1.0),
        ],
    };
    let text = serde_json::to_string(&metric).unwrap();
    assert!(text.starts_with("{\"baseline\":[[0.0,0.0],[0.5,0.0]]"));
    let back: CharMetric = serde_json::from_str(&text).unwrap();
    assert_eq!(back, metric);
}
