//! TOML description of an envelope to encode.
//!
//! ```toml
//! id = 42
//!
//! [destination]
//! kind = "topic"
//! target = "/trains"
//!
//! [content]
//! kind = "error"
//! code = 404
//! reason = "no such station"
//! ```

use anyhow::{Context, Result};
use flatwire_envelope::{
    create_empty, finish_envelope_buffer, ContentRef, Destination, DestinationArgs,
    DestinationKind, Envelope, EnvelopeArgs, EnvelopeError, ErrorArgs,
};
use flatwire_table::{Builder, BuilderOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvelopeInput {
    pub id: i32,
    pub destination: Option<DestinationInput>,
    pub content: Option<ContentInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DestinationInput {
    #[serde(default)]
    pub kind: DestinationKind,
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ContentInput {
    NoMessage,
    Success,
    Error {
        #[serde(default)]
        code: u16,
        category: Option<String>,
        reason: Option<String>,
    },
    /// Empty table under a caller-chosen tag.
    Raw { tag: u8 },
}

impl ContentInput {
    fn build(&self, builder: &mut Builder) -> Result<ContentRef, EnvelopeError> {
        match self {
            Self::NoMessage => Ok(ContentRef::no_message(builder)),
            Self::Success => Ok(ContentRef::success(builder)),
            Self::Error { code, category, reason } => Ok(ContentRef::error(
                builder,
                &ErrorArgs { code: *code, category: category.as_deref(), reason: reason.as_deref() },
            )),
            Self::Raw { tag } => {
                let offset = create_empty(builder);
                ContentRef::raw(*tag, offset)
            }
        }
    }
}

impl EnvelopeInput {
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("invalid envelope description")
    }

    /// Build a finished envelope buffer.
    pub fn encode(&self, options: BuilderOptions) -> Result<Vec<u8>> {
        let mut builder = Builder::with_options(options);
        let destination = self.destination.as_ref().map(|destination| {
            Destination::create(
                &mut builder,
                &DestinationArgs { kind: destination.kind, target: destination.target.as_deref() },
            )
        });
        let content = self
            .content
            .as_ref()
            .map(|content| content.build(&mut builder))
            .transpose()
            .context("invalid content")?;
        let root =
            Envelope::create(&mut builder, &EnvelopeArgs { destination, content, id: self.id });
        finish_envelope_buffer(&mut builder, root);
        log::debug!(
            "flatwire: encoded envelope id={} into {} bytes ({} vtables)",
            self.id,
            builder.used_space(),
            builder.vtable_count()
        );
        Ok(builder.into_finished_data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatwire_envelope::Content;

    #[test]
    fn parses_documented_example() {
        let input = EnvelopeInput::from_toml(
            r#"
            id = 42

            [destination]
            kind = "topic"
            target = "/trains"

            [content]
            kind = "error"
            code = 404
            reason = "no such station"
            "#,
        )
        .expect("parse");
        assert_eq!(input.id, 42);
        assert_eq!(
            input.destination,
            Some(DestinationInput { kind: DestinationKind::Topic, target: Some("/trains".into()) })
        );
        assert_eq!(
            input.content,
            Some(ContentInput::Error {
                code: 404,
                category: None,
                reason: Some("no such station".into())
            })
        );
    }

    #[test]
    fn misspelled_content_key_is_rejected() {
        let err = EnvelopeInput::from_toml(
            "id = 1\n[content]\nkind = \"error\"\ncode = 4\nresaon = \"typo\"\n",
        )
        .expect_err("unknown key under [content]");
        assert!(format!("{err:#}").contains("resaon"), "{err:#}");
    }

    #[test]
    fn unknown_content_kind_is_rejected() {
        assert!(EnvelopeInput::from_toml("[content]\nkind = \"maybe\"\n").is_err());
    }

    #[test]
    fn encodes_readable_envelope() {
        let input = EnvelopeInput {
            id: 3,
            destination: None,
            content: Some(ContentInput::Success),
        };
        let bytes = input.encode(BuilderOptions::default()).expect("encode");
        let envelope = Envelope::wrap(&bytes).expect("wrap");
        assert_eq!(envelope.id(), 3);
        assert_eq!(envelope.content(), Ok(Content::Success));
    }

    #[test]
    fn raw_tag_zero_is_rejected() {
        let input = EnvelopeInput { content: Some(ContentInput::Raw { tag: 0 }), ..Default::default() };
        let err = input.encode(BuilderOptions::default()).expect_err("tag 0 must fail");
        assert!(format!("{err:#}").contains("content type 0"));
    }

    #[test]
    fn force_defaults_writes_zero_id() {
        let input = EnvelopeInput::default();
        let compact = input.encode(BuilderOptions::default()).expect("encode");
        let forced = input
            .encode(BuilderOptions { force_defaults: true, ..Default::default() })
            .expect("encode");
        let slots = |bytes: &[u8]| {
            Envelope::wrap(bytes)
                .expect("wrap")
                .table()
                .vtable()
                .expect("vtable")
                .present_slots()
                .count()
        };
        assert_eq!(slots(&compact), 0);
        assert_eq!(slots(&forced), 1);
        assert!(forced.len() > compact.len());
    }
}
