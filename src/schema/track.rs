use serde::{Deserialize, Serialize};

/// A beat in the track catalog.
///
/// Field names follow the platform export (`fileUrl`, `availableForPurchase`)
/// so the same struct reads both the RON catalog and the platform JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub name: String,
    #[serde(default)]
    pub producers: Option<Vec<String>>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    #[serde(default)]
    pub moods: Option<Vec<String>>,
    #[serde(default)]
    pub bpm: Option<f64>,
    pub file_url: String,
    pub page_url: String,
    /// `None` means nobody recorded a sale, so the beat is assumed purchasable.
    #[serde(default)]
    pub available_for_purchase: Option<bool>,
}

/// Which tag list of a [`Track`] a keyword filter looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagField {
    Producers,
    Genres,
    Moods,
}

impl Track {
    /// Returns the tag list for `field`, if the catalog entry has one.
    pub fn tags(&self, field: TagField) -> Option<&[String]> {
        match field {
            TagField::Producers => self.producers.as_deref(),
            TagField::Genres => self.genres.as_deref(),
            TagField::Moods => self.moods.as_deref(),
        }
    }

    /// True unless the beat is explicitly marked as sold.
    pub fn is_purchasable(&self) -> bool {
        self.available_for_purchase != Some(false)
    }

    /// Tempo comparisons treat a zero tempo the same as a missing one.
    pub fn tempo(&self) -> Option<f64> {
        self.bpm.filter(|bpm| *bpm != 0.0)
    }
}
