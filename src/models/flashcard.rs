//! Flashcard is a pair <front, back>. Only text is used on either side
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

impl Flashcard {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flashcard_creation() {
        let card = Flashcard::new("cześć", "hello");

        assert_eq!(card.front, "cześć");
        assert_eq!(card.back, "hello");
    }

    #[test]
    fn test_flashcard_json_shape() {
        let json = serde_json::to_value(Flashcard::new("proszę", "please")).unwrap();
        assert_eq!(json, serde_json::json!({ "front": "proszę", "back": "please" }));
    }
}
