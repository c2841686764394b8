use serde::{Deserialize, Serialize};

/// Sentinel used for any field the parser could not read from the card
pub const NOT_FOUND: &str = "Not Found";

/// Identity fields extracted from a single OCR pass over a student card.
///
/// Image references are opaque handles owned by the capture client. They are
/// carried along while the registration flow runs and never persisted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScannedData {
    pub full_name: String,
    pub student_id: String,
    pub identification_number: String,
    pub major: String,
    pub intake: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_image: Option<String>,
}

impl ScannedData {
    /// True when every text field was read from the card
    pub fn is_complete(&self) -> bool {
        [
            &self.full_name,
            &self.student_id,
            &self.identification_number,
            &self.major,
            &self.intake,
        ]
        .iter()
        .all(|field| field.as_str() != NOT_FOUND)
    }

    /// Names of the fields still holding the sentinel
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.full_name == NOT_FOUND {
            missing.push("fullName");
        }
        if self.student_id == NOT_FOUND {
            missing.push("studentId");
        }
        if self.identification_number == NOT_FOUND {
            missing.push("identificationNumber");
        }
        if self.major == NOT_FOUND {
            missing.push("major");
        }
        if self.intake == NOT_FOUND {
            missing.push("intake");
        }
        missing
    }

    pub fn with_back_image(mut self, back_image: impl Into<String>) -> Self {
        self.back_image = Some(back_image.into());
        self
    }
}
