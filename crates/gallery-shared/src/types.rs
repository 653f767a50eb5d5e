use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GalleryError;

// Closed set of categories an image can be filed under. Declaration order is
// the order shown to users.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Grief,
    Love,
    Friendship,
    Family,
    Party,
    Work,
    Marriage,
    MothersDay,
    Birthday,
    Eastern,
    Christmas,
    Anniversary,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Self::Grief,
        Self::Love,
        Self::Friendship,
        Self::Family,
        Self::Party,
        Self::Work,
        Self::Marriage,
        Self::MothersDay,
        Self::Birthday,
        Self::Eastern,
        Self::Christmas,
        Self::Anniversary,
    ];

    /// Stable code stored in the database and accepted in requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grief => "grief",
            Self::Love => "love",
            Self::Friendship => "friendship",
            Self::Family => "family",
            Self::Party => "party",
            Self::Work => "work",
            Self::Marriage => "marriage",
            Self::MothersDay => "mothers_day",
            Self::Birthday => "birthday",
            Self::Eastern => "eastern",
            Self::Christmas => "christmas",
            Self::Anniversary => "anniversary",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Grief => "Grief",
            Self::Love => "Love",
            Self::Friendship => "Friendship",
            Self::Family => "Family",
            Self::Party => "Party",
            Self::Work => "Work",
            Self::Marriage => "Marriage",
            Self::MothersDay => "Mother's Day",
            Self::Birthday => "Birthday",
            Self::Eastern => "Eastern",
            Self::Christmas => "Christmas",
            Self::Anniversary => "Anniversary",
        }
    }
}

impl FromStr for Category {
    type Err = GalleryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| GalleryError::UnknownCategory(s.to_string()))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file received from a client, not yet written to the asset tree.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    /// Original file name as sent by the client. Empty when the form field
    /// was left blank.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// An upload with no file name carries no asset; saving it only touches
    /// metadata.
    pub fn has_content(&self) -> bool {
        !self.filename.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_codes_roundtrip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_unknown_category_rejected() {
        assert!("holiday".parse::<Category>().is_err());
        assert!("".parse::<Category>().is_err());
        // codes are case-sensitive
        assert!("Love".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serializes_as_code() {
        let json = serde_json::to_string(&Category::MothersDay).unwrap();
        assert_eq!(json, "\"mothers_day\"");
    }

    #[test]
    fn test_blank_upload_has_no_content() {
        assert!(!UploadedFile::default().has_content());
        assert!(UploadedFile::new("a.png", vec![1]).has_content());
    }
}
