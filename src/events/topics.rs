//! Format to topic mapping.
//!
//! The table is closed: every `PayloadFormat` has exactly one topic and
//! content types outside the table are rejected, never defaulted.

pub use crate::domain::{PayloadFormat, UnsupportedFormat};

use crate::config::EventsConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicTable {
    json: String,
    xml: String,
}

impl Default for TopicTable {
    fn default() -> Self {
        Self::from(&EventsConfig::default())
    }
}

impl From<&EventsConfig> for TopicTable {
    fn from(config: &EventsConfig) -> Self {
        Self::new(config.json_topic.clone(), config.xml_topic.clone())
    }
}

impl TopicTable {
    pub fn new(json: impl Into<String>, xml: impl Into<String>) -> Self {
        Self {
            json: json.into(),
            xml: xml.into(),
        }
    }

    pub fn topic_for(&self, format: PayloadFormat) -> &str {
        match format {
            PayloadFormat::Json => &self.json,
            PayloadFormat::Xml => &self.xml,
        }
    }

    /// Parse a content type and return its format and topic.
    pub fn resolve(&self, content_type: &str) -> Result<(PayloadFormat, &str), UnsupportedFormat> {
        let format: PayloadFormat = content_type.parse()?;
        Ok((format, self.topic_for(format)))
    }
}
