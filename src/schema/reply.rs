use serde::{Deserialize, Serialize};

/// A titled field inside a [`Card`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFooter {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// A structured reply block. Serializes to the platform's embed shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<CardField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<CardFooter>,
}

impl Card {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(CardField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>, icon_url: Option<&str>) -> Self {
        self.footer = Some(CardFooter {
            text: text.into(),
            icon_url: icon_url.map(str::to_string),
        });
        self
    }

    /// Looks up a field value by its name.
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// What a command sends back to the invoking user.
///
/// Validation problems are ordinary `Text` replies, never errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reply {
    Text(String),
    Cards(Vec<Card>),
}

impl Reply {
    pub fn text(message: impl Into<String>) -> Self {
        Self::Text(message.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Cards(_) => None,
        }
    }

    pub fn cards(&self) -> &[Card] {
        match self {
            Self::Text(_) => &[],
            Self::Cards(cards) => cards,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_builder() {
        let card = Card::new("Title")
            .description("Series")
            .field("Ace", "as someone", true)
            .footer("careful", Some("https://example.com/icon.png"));
        assert_eq!(card.title, "Title");
        assert_eq!(card.description.as_deref(), Some("Series"));
        assert_eq!(card.field_value("Ace"), Some("as someone"));
        assert!(card.field_value("Nobody").is_none());
        assert_eq!(card.footer.unwrap().text, "careful");
    }

    #[test]
    fn card_json_skips_empty_parts() {
        let json = serde_json::to_value(Card::new("Only a title")).unwrap();
        assert_eq!(json, serde_json::json!({ "title": "Only a title" }));
    }

    #[test]
    fn reply_accessors() {
        let text = Reply::text("No matching beats found.");
        assert_eq!(text.as_text(), Some("No matching beats found."));
        assert!(text.cards().is_empty());

        let cards = Reply::Cards(vec![Card::new("a"), Card::new("b")]);
        assert!(cards.as_text().is_none());
        assert_eq!(cards.cards().len(), 2);
    }
}
