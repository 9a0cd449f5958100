use serde::{Deserialize, Serialize};

/// A fictional character that can be cast in a matchup.
///
/// The JSON export from the knowledge-base query names the label column
/// `fictional_characterLabel`; both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    #[serde(alias = "fictional_characterLabel")]
    pub label: String,
    pub article: String,
}

/// The community members who get cast in matchups, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster(pub Vec<String>);

impl Roster {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn members(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for Roster {
    fn from(members: Vec<String>) -> Self {
        Self(members)
    }
}
