//! Request bodies for API tests.

use serde_json::{json, Value};

/// Ten topics over two subdisciplines; planning order is A1..A5, B1..B5.
pub fn ten_topics() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Cardiology", "A1"),
        ("Cardiology", "A2"),
        ("Cardiology", "A3"),
        ("Cardiology", "A4"),
        ("Cardiology", "A5"),
        ("Nephrology", "B1"),
        ("Nephrology", "B2"),
        ("Nephrology", "B3"),
        ("Nephrology", "B4"),
        ("Nephrology", "B5"),
    ]
}

pub fn create_card_request(question: &str, legacy_interval: Option<i32>) -> Value {
    json!({
        "question_text": question,
        "answer_text": format!("Answer to {}", question),
        "notes": null,
        "interval": legacy_interval,
    })
}

pub fn rate_request(card_id: i64, quality: &str) -> Value {
    json!({ "card_id": card_id, "quality": quality })
}

/// Monday 2 slots, Wednesday 3 slots
pub fn mon_wed_availability() -> Value {
    json!({ "Mon": 2, "Wed": 3 })
}

pub fn generate_schedule_request(
    discipline_id: i64,
    start_date: &str,
    regenerate_from: Option<&str>,
) -> Value {
    json!({
        "discipline_id": discipline_id,
        "availability": mon_wed_availability(),
        "start_date": start_date,
        "regenerate_from": regenerate_from,
    })
}

pub fn question_log_request(done: i32, correct: i32) -> Value {
    json!({
        "topic_id": null,
        "questions_done": done,
        "correct_answers": correct,
        "logged_on": "2024-02-01",
    })
}
