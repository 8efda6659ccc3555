use std::path::Path;

use async_trait::async_trait;
use lofty::config::WriteOptions;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::tag::{Accessor, Tag, TagExt, TagType};

use crate::error::{Error, Result};
use crate::track::Track;
use crate::traits::{Artwork, Tagger};

/// Writes ID3v2 tags with lofty. The downloaded file is treated as untagged;
/// whatever frames it might carry are not parsed and get replaced wholesale.
pub struct LoftyTagger;

#[async_trait]
impl Tagger for LoftyTagger {
    fn id(&self) -> &'static str {
        "lofty"
    }

    fn name(&self) -> &'static str {
        "lofty"
    }

    async fn embed(&self, path: &Path, track: &Track, artwork: Option<Artwork>) -> Result<()> {
        let mut tag = Tag::new(TagType::Id3v2);
        tag.set_artist(track.artist().to_string());
        tag.set_title(track.title().to_string());
        if track.year() > 0 {
            tag.set_year(track.year());
        }

        if let Some(artwork) = artwork {
            let mime = match artwork.mime_type.as_str() {
                "image/jpeg" => MimeType::Jpeg,
                "image/png" => MimeType::Png,
                other => MimeType::Unknown(other.to_string()),
            };
            tag.push_picture(Picture::new_unchecked(
                PictureType::CoverFront,
                Some(mime),
                None,
                artwork.bytes,
            ));
        }

        tag.save_to_path(path, WriteOptions::default())
            .map_err(|e| Error::Tag(format!("couldn't save tag to {}: {e}", path.display())))
    }
}
