//! Mapping between gateway metadata and `object_store` attributes, shared by the
//! S3 and in-memory backends.

use object_store::{Attribute, Attributes, PutOptions};
use stowage_core::constants::DEFAULT_MIME_TYPE;
use stowage_core::ObjectMetadata;

/// Put options carrying the content type and custom metadata of an upload.
pub(crate) fn put_options(content_type: &str, metadata: &ObjectMetadata) -> PutOptions {
    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, content_type.to_string().into());
    for (name, value) in metadata.to_pairs() {
        attributes.insert(Attribute::Metadata(name.into()), value.into());
    }

    PutOptions {
        attributes,
        ..Default::default()
    }
}

pub(crate) fn content_type(attributes: &Attributes) -> String {
    attributes
        .get(&Attribute::ContentType)
        .map(|value| value.as_ref().to_string())
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
}

pub(crate) fn metadata(attributes: &Attributes) -> Option<ObjectMetadata> {
    ObjectMetadata::from_pairs(attributes.iter().filter_map(|(attribute, value)| {
        match attribute {
            Attribute::Metadata(name) => Some((name.as_ref(), value.as_ref())),
            _ => None,
        }
    }))
}
